//! Step command execution.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{BuildError, Result};

/// Outcome of one executed step command.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Exit code (0 = success).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes a lowered provisioning command.
///
/// The seam between the builder and the host: production builds use
/// [`ShellExecutor`]; tests use the scripted executor in
/// [`crate::fakes`] so builds never require root or network access.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Run `command` with `cwd` as working directory, bounded by
    /// `timeout_secs` (0 = no timeout).
    async fn run(
        &self,
        step_name: &str,
        command: &[String],
        cwd: &Path,
        timeout_secs: u64,
    ) -> Result<CommandOutcome>;
}

/// Executor backed by real subprocesses.
pub struct ShellExecutor;

#[async_trait]
impl StepExecutor for ShellExecutor {
    async fn run(
        &self,
        step_name: &str,
        command: &[String],
        cwd: &Path,
        timeout_secs: u64,
    ) -> Result<CommandOutcome> {
        let start = Instant::now();

        let (exe, args) = command
            .split_first()
            .ok_or_else(|| BuildError::EmptyCommand(step_name.to_string()))?;

        let child = Command::new(exe)
            .args(args)
            .current_dir(cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let output = if timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| BuildError::Timeout {
                step: step_name.to_string(),
                timeout_secs,
            })??
        } else {
            child.wait_with_output().await?
        };

        Ok(CommandOutcome {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
