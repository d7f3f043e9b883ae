//! Common test utilities for bearing integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't touch the
//! user's `~/.local/share/bearing/` or `~/.config/bearing/` directories.

#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::Value;
pub use tempfile::TempDir;

/// A test environment with isolated data and config directories.
///
/// The `bearing()` method returns a `Command` that sets `BEARING_DATA_DIR`
/// and `BEARING_CONFIG_DIR` per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub data_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment and initialize the data directory.
    pub fn init() -> Self {
        let env = Self::new();
        env.bearing().args(["system", "init"]).assert().success();
        env
    }

    /// Get a Command for the bearing binary with isolated directories.
    pub fn bearing(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bearing"));
        cmd.current_dir(self.data_dir.path());
        cmd.env("BEARING_DATA_DIR", self.data_dir.path());
        cmd.env("BEARING_CONFIG_DIR", self.config_dir.path());
        cmd.env_remove("BEARING_CASCADE_POLICY");
        cmd.env_remove("BEARING_TODAY");
        cmd.env_remove("BEARING_LOG");
        cmd
    }

    /// Run a command that must succeed and parse its JSON output.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self.bearing().args(args).assert().success().get_output().clone();
        parse_json(&output.stdout)
    }

    /// Run a command that must be rejected (exit code 2) and parse its output.
    pub fn rejected(&self, args: &[&str]) -> Value {
        let output = self.bearing().args(args).assert().code(2).get_output().clone();
        parse_json(&output.stdout)
    }

    /// Create a theme and return its id.
    pub fn theme(&self, name: &str) -> String {
        let value = self.json(&["theme", "create", name]);
        value["value"]["id"].as_str().unwrap().to_string()
    }

    /// Create a task and return its id.
    pub fn task(&self, theme: &str, title: &str, extra: &[&str]) -> String {
        let mut args = vec!["task", "create", theme, title];
        args.extend_from_slice(extra);
        let value = self.json(&args);
        value["value"]["updated"][0]["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }

    /// Commit subjects of the data directory, newest first.
    pub fn history(&self) -> Vec<String> {
        let value = self.json(&["system", "history", "-n", "100"]);
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["message"].as_str().unwrap().to_string())
            .collect()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse JSON command output.
pub fn parse_json(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).unwrap_or_else(|e| {
        panic!(
            "invalid JSON output ({}): {}",
            e,
            String::from_utf8_lossy(stdout)
        )
    })
}
