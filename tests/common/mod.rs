//! Common test utilities for qlog integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't touch the user's
//! `~/.local/share/questlog/` directory or config.kdl.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

pub const PASSWORD: &str = "correct horse battery staple";

/// A test environment with isolated data and config directories.
///
/// The `qlog()` method returns a `Command` that sets `QLOG_DATA_DIR` and `XDG_CONFIG_HOME`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub data_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment with an initialized vault.
    pub fn init() -> Self {
        let env = Self::new();
        env.qlog()
            .args(["init", "--password", PASSWORD])
            .assert()
            .success();
        env
    }

    /// Get a Command for the qlog binary with isolated directories.
    pub fn qlog(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_qlog"));
        cmd.env("QLOG_DATA_DIR", self.data_dir.path());
        cmd.env("XDG_CONFIG_HOME", self.config_dir.path());
        cmd.env_remove("QLOG_PASSWORD");
        cmd.env_remove("QLOG_NEW_PASSWORD");
        cmd.env_remove("QLOG_LOG");
        cmd
    }

    /// Run `qlog dispatch` and return its parsed JSON output.
    pub fn dispatch(&self, action: &str) -> serde_json::Value {
        let output = self
            .qlog()
            .args(["dispatch", "--password", PASSWORD, action])
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "dispatch failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    /// Run `qlog show --full` and return the state.
    pub fn state(&self) -> serde_json::Value {
        let output = self
            .qlog()
            .args(["show", "--full", "--password", PASSWORD])
            .output()
            .unwrap();
        assert!(output.status.success());
        let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        shown["state"].clone()
    }

    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }

    /// Write `content` as config.kdl.
    pub fn write_config(&self, content: &str) {
        let dir = self.config_dir.path().join("questlog");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.kdl"), content).unwrap();
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
