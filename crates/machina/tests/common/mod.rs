//! Common test utilities for Machina integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Variables the binary reads that must not leak in from the host
const HOST_VARS: &[&str] = &[
    "PROVIDER_API_KEY",
    "GITHUB_TOKEN",
    "GITHUB_NAME",
    "GITHUB_EMAIL",
    "MACHINA_MODEL",
    "MACHINA_PROVIDER_API_BASE",
    "MACHINA_GITHUB_API_BASE",
    "MACHINA_PROMPT_FILE",
    "RUST_LOG",
];

/// Isolated HOME with its own config directory and prompt document
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let config_dir = temp_dir.path().join(".machina");
        std::fs::create_dir_all(&config_dir)?;

        Ok(Self {
            temp_dir,
            config_dir,
        })
    }

    pub fn config_file(&self, name: &str) -> PathBuf {
        self.config_dir.join(name)
    }

    /// Path of the local prompt document used by `command()`
    pub fn prompt_file(&self) -> PathBuf {
        self.temp_dir.path().join("machina.yaml")
    }

    pub fn write_prompt(&self, body: &str) -> anyhow::Result<()> {
        std::fs::write(self.prompt_file(), body)?;
        Ok(())
    }

    pub fn write_config(&self, body: &str) -> anyhow::Result<()> {
        std::fs::write(self.config_file("config.json"), body)?;
        Ok(())
    }

    /// Binary with a clean environment pointed at this test's files
    pub fn command(&self) -> Command {
        Command::from_std(self.std_command())
    }

    /// Same as `command()`, for tests that manage the child process themselves
    pub fn std_command(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_machina"));
        for var in HOST_VARS {
            cmd.env_remove(var);
        }
        cmd.env("HOME", self.temp_dir.path());
        cmd.env("MACHINA_PROMPT_FILE", self.prompt_file());
        cmd
    }

    /// `command()` with both remote endpoints served by a local server
    pub fn command_against(&self, server_url: &str) -> Command {
        let mut cmd = self.command();
        cmd.env("MACHINA_GITHUB_API_BASE", server_url);
        cmd.env("MACHINA_PROVIDER_API_BASE", server_url);
        cmd.env("PROVIDER_API_KEY", "sk-ant-test");
        cmd
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}
