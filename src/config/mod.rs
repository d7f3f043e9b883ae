//! Configuration for Bearing.
//!
//! Preferences live in `config.kdl` files at two levels:
//!
//! - System: `~/.config/bearing/config.kdl` (or `$BEARING_CONFIG_DIR/config.kdl`)
//! - Data root: `<data-dir>/config.kdl`, never recorded in the history
//!
//! Contains:
//! - `data-dir` - Where the planning data lives (system level only)
//! - `cascade-policy` - Subtask handling when a parent finishes or is deleted
//! - `output-format` - "json" or "human"
//! - `author-name`, `author-email` - Author of history entries
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    CASCADE_POLICY_ENV, CONFIG_DIR_ENV, CONFIG_FILE, ConfigOverrides, DATA_DIR_ENV, Resolved,
    ResolvedConfig, ValueSource, read_config_file, resolve_config, system_config_path,
    write_config_file,
};
pub use schema::{BearingConfig, OutputFormat};
