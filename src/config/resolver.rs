//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`BEARING_DATA_DIR`, `BEARING_CASCADE_POLICY`)
//! 3. Data-root config.kdl (`<data-dir>/config.kdl`)
//! 4. System config.kdl (`~/.config/bearing/config.kdl`)
//! 5. Built-in defaults
//!
//! The data root is resolved first, without the data-root layer, since that
//! layer lives inside it.

use crate::config::{BearingConfig, OutputFormat};
use crate::models::CascadePolicy;
use crate::storage::vcs::{DEFAULT_AUTHOR_EMAIL, DEFAULT_AUTHOR_NAME, LOCAL_CONFIG_FILE};
use crate::{Error, Result};
use serde::{Serialize, Serializer};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Environment variable selecting the data root.
pub const DATA_DIR_ENV: &str = "BEARING_DATA_DIR";
/// Environment variable selecting the cascade policy.
pub const CASCADE_POLICY_ENV: &str = "BEARING_CASCADE_POLICY";
/// Environment variable replacing the system config directory.
pub const CONFIG_DIR_ENV: &str = "BEARING_CONFIG_DIR";
/// Name of the config file at both levels.
pub const CONFIG_FILE: &str = LOCAL_CONFIG_FILE;

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from the data root's config.kdl
    DataRoot,
    /// Value from the system config.kdl
    System,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::DataRoot => write!(f, "data-root"),
            ValueSource::System => write!(f, "system"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, Serialize)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    /// Data root holding the versioned planning data
    pub data_dir: Resolved<PathBuf>,
    /// Subtask cascade policy
    pub cascade_policy: Resolved<CascadePolicy>,
    /// Output format preference
    pub output_format: Resolved<OutputFormat>,
    /// Author name of history entries
    pub author_name: Resolved<String>,
    /// Author email of history entries
    pub author_email: Resolved<String>,
}

impl ResolvedConfig {
    /// Get the data root.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir.value
    }

    /// Get the cascade policy.
    pub fn cascade_policy(&self) -> CascadePolicy {
        self.cascade_policy.value
    }

    /// Get the output format.
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    /// Path of the data root's config file.
    pub fn data_root_config_path(&self) -> PathBuf {
        self.data_dir.value.join(CONFIG_FILE)
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Data root override from CLI flag
    pub data_dir: Option<PathBuf>,
    /// Cascade policy override from CLI flag
    pub cascade_policy: Option<CascadePolicy>,
    /// Output format override from CLI flag
    pub output_format: Option<OutputFormat>,
}

impl ConfigOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set data root override.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set cascade policy override.
    pub fn with_cascade_policy(mut self, policy: CascadePolicy) -> Self {
        self.cascade_policy = Some(policy);
        self
    }

    /// Set output format override.
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}

/// Directory of the system config file.
///
/// `BEARING_CONFIG_DIR` replaces the platform config directory.
pub fn system_config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join("bearing")),
    }
}

/// Path of the system config file.
pub fn system_config_path() -> Option<PathBuf> {
    system_config_dir().map(|d| d.join(CONFIG_FILE))
}

/// Read a config file. A missing file reads as an empty config.
pub fn read_config_file(path: &Path) -> Result<BearingConfig> {
    match fs::read_to_string(path) {
        Ok(text) => BearingConfig::parse(&text).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(BearingConfig::new()),
        Err(e) => Err(e.into()),
    }
}

/// Write a config file, creating its directory.
pub fn write_config_file(path: &Path, config: &BearingConfig) -> Result<()> {
    config.validate().map_err(Error::Config)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, config.to_kdl_string())?;
    tracing::debug!(path = %path.display(), "config written");
    Ok(())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Resolve configuration with the full precedence chain.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let system = match system_config_path() {
        Some(path) => read_config_file(&path)?,
        None => BearingConfig::new(),
    };

    let data_dir = if let Some(dir) = &overrides.data_dir {
        Resolved::new(dir.clone(), ValueSource::CliFlag)
    } else if let Some(dir) = env_value(DATA_DIR_ENV) {
        Resolved::new(PathBuf::from(dir), ValueSource::EnvVar(DATA_DIR_ENV.to_string()))
    } else if let Some(dir) = &system.data_dir {
        Resolved::new(dir.clone(), ValueSource::System)
    } else {
        let dir = dirs::data_dir().map(|d| d.join("bearing")).ok_or_else(|| {
            Error::Config(format!(
                "Cannot determine a data directory; set {} or pass --data-dir",
                DATA_DIR_ENV
            ))
        })?;
        Resolved::new(dir, ValueSource::Default)
    };

    let data_root = read_config_file(&data_dir.value.join(CONFIG_FILE))?;
    if data_root.data_dir.is_some() {
        tracing::warn!("data-dir in a data-root config.kdl is ignored");
    }

    let cascade_policy = if let Some(policy) = overrides.cascade_policy {
        Resolved::new(policy, ValueSource::CliFlag)
    } else if let Some(raw) = env_value(CASCADE_POLICY_ENV) {
        let policy = CascadePolicy::parse(&raw).ok_or_else(|| {
            Error::Config(format!("{} has an unknown policy: {}", CASCADE_POLICY_ENV, raw))
        })?;
        Resolved::new(policy, ValueSource::EnvVar(CASCADE_POLICY_ENV.to_string()))
    } else {
        layered(data_root.cascade_policy, system.cascade_policy, CascadePolicy::default())
    };

    let output_format = match overrides.output_format {
        Some(format) => Resolved::new(format, ValueSource::CliFlag),
        None => layered(data_root.output_format, system.output_format, OutputFormat::default()),
    };

    Ok(ResolvedConfig {
        data_dir,
        cascade_policy,
        output_format,
        author_name: layered(
            data_root.author_name,
            system.author_name,
            DEFAULT_AUTHOR_NAME.to_string(),
        ),
        author_email: layered(
            data_root.author_email,
            system.author_email,
            DEFAULT_AUTHOR_EMAIL.to_string(),
        ),
    })
}

fn layered<T>(data_root: Option<T>, system: Option<T>, default: T) -> Resolved<T> {
    match (data_root, system) {
        (Some(v), _) => Resolved::new(v, ValueSource::DataRoot),
        (None, Some(v)) => Resolved::new(v, ValueSource::System),
        (None, None) => Resolved::new(default, ValueSource::Default),
    }
}
