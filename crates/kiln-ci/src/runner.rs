//! Check execution against a source tree.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;

use crate::check::{CheckConfig, CheckResult};
use crate::error::{CiError, Result};

/// Executes one configured check in a source tree.
pub struct CheckRunner;

impl CheckRunner {
    /// Execute a single check with `tree` as its working directory.
    ///
    /// A non-zero exit from the tool is a normal, unsuccessful
    /// [`CheckResult`]; only spawn failures, timeouts, and empty
    /// commands surface as errors.
    pub async fn execute(config: &CheckConfig, tree: &Path) -> Result<CheckResult> {
        let start = Instant::now();

        if config.command.is_empty() {
            return Err(CiError::EmptyCommand {
                check: config.name.clone(),
            });
        }

        let exe = &config.command[0];
        let args = &config.command[1..];

        let child = Command::new(exe)
            .args(args)
            .current_dir(tree)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CiError::Spawn {
                check: config.name.clone(),
                source: e,
            })?;

        let output = if config.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(config.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| CiError::Timeout {
                check: config.name.clone(),
                timeout_secs: config.timeout_secs,
            })??
        } else {
            child.wait_with_output().await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let success = output.status.success();

        Ok(CheckResult {
            check_name: config.name.clone(),
            exit_code,
            stdout,
            stderr,
            duration_ms,
            success,
        })
    }
}
