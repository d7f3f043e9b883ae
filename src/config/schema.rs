//! KDL schema for config.kdl.
//!
//! ```kdl
//! data-dir "/home/me/planning"
//! cascade-policy "archive"   // none, archive, delete or promote
//! output-format "human"      // or "json"
//! author-name "Me"
//! author-email "me@example.com"
//! ```
//!
//! Unknown nodes are ignored so that older binaries can read newer files.

use crate::models::CascadePolicy;
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Preferences stored in config.kdl.
///
/// Every field is optional; an absent field falls through to the next
/// layer during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearingConfig {
    /// Data root holding the versioned planning data
    pub data_dir: Option<PathBuf>,

    /// What happens to subtasks when their parent finishes or is deleted
    pub cascade_policy: Option<CascadePolicy>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// Author name recorded on history entries
    pub author_name: Option<String>,

    /// Author email recorded on history entries
    pub author_email: Option<String>,
}

impl BearingConfig {
    /// Create an empty config with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(dir) = &self.data_dir {
            if dir.as_os_str().is_empty() {
                return Err("data-dir must not be empty".to_string());
            }
        }
        if let Some(name) = &self.author_name {
            if name.trim().is_empty() {
                return Err("author-name must not be empty".to_string());
            }
        }
        if let Some(email) = &self.author_email {
            if !email.contains('@') || email.contains(['<', '>']) {
                return Err(format!("author-email is not an address: {}", email));
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    ///
    /// Values of the wrong type or with unknown names are skipped.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        Self {
            data_dir: string_value(doc, "data-dir").map(PathBuf::from),
            cascade_policy: string_value(doc, "cascade-policy").and_then(CascadePolicy::parse),
            output_format: string_value(doc, "output-format").and_then(OutputFormat::parse),
            author_name: string_value(doc, "author-name").map(str::to_string),
            author_email: string_value(doc, "author-email").map(str::to_string),
        }
    }

    /// Parse config from KDL text.
    pub fn parse(text: &str) -> crate::Result<Self> {
        let doc: KdlDocument = text
            .parse()
            .map_err(|e| crate::Error::Config(format!("Invalid config.kdl: {}", e)))?;
        let config = Self::from_kdl(&doc);
        config.validate().map_err(crate::Error::Config)?;
        Ok(config)
    }

    /// Render config as KDL text.
    pub fn to_kdl_string(&self) -> String {
        let mut doc = self.to_kdl();
        doc.autoformat();
        doc.to_string()
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(dir) = &self.data_dir {
            push_string(&mut doc, "data-dir", dir.to_string_lossy().into_owned());
        }
        if let Some(policy) = self.cascade_policy {
            push_string(&mut doc, "cascade-policy", policy.as_str().to_string());
        }
        if let Some(format) = self.output_format {
            push_string(&mut doc, "output-format", format.as_str().to_string());
        }
        if let Some(name) = &self.author_name {
            push_string(&mut doc, "author-name", name.clone());
        }
        if let Some(email) = &self.author_email {
            push_string(&mut doc, "author-email", email.clone());
        }

        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &BearingConfig) {
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir.clone();
        }
        if other.cascade_policy.is_some() {
            self.cascade_policy = other.cascade_policy;
        }
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
        if other.author_name.is_some() {
            self.author_name = other.author_name.clone();
        }
        if other.author_email.is_some() {
            self.author_email = other.author_email.clone();
        }
    }

    /// Set one value by its KDL key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "data-dir" => self.data_dir = Some(PathBuf::from(value)),
            "cascade-policy" => {
                self.cascade_policy = Some(
                    CascadePolicy::parse(value)
                        .ok_or_else(|| format!("Unknown cascade policy: {}", value))?,
                )
            }
            "output-format" => {
                self.output_format = Some(
                    OutputFormat::parse(value)
                        .ok_or_else(|| format!("Unknown output format: {}", value))?,
                )
            }
            "author-name" => self.author_name = Some(value.to_string()),
            "author-email" => self.author_email = Some(value.to_string()),
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        self.validate()
    }

    /// Whether no value is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn string_value<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a str> {
    doc.get(name)?.entries().first()?.value().as_string()
}

fn push_string(doc: &mut KdlDocument, name: &str, value: String) {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(KdlValue::String(value)));
    doc.nodes_mut().push(node);
}
