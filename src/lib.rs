//! Bearing - a personal planning engine.
//!
//! This library provides the core of the `bearing` CLI: life themes with
//! nested objectives and key results, a task board with workflow rules,
//! and a git-backed store that records every mutation as one commit.

pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod planner;
pub mod storage;
pub mod workflow;


/// Library-level error type for Bearing operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not initialized: run `bearing system init` first")]
    NotInitialized,

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Staged path does not exist: {0}")]
    MissingPath(String),

    #[error("Data directory is locked by another process: {0}")]
    Locked(String),

    #[error("Version store error: {0}")]
    VersionStore(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error means a referenced entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Result type alias for Bearing operations.
pub type Result<T> = std::result::Result<T, Error>;
