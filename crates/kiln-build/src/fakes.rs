//! Scripted executor and fetcher for tests.
//!
//! Builds driven by these never touch the package mirror or the
//! network, so provisioning semantics stay testable on any machine.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::executor::{CommandOutcome, StepExecutor};
use crate::fetch::Fetcher;

/// Executor that records every lowered command and replays canned
/// outcomes. By default every command succeeds; `failing_on` makes all
/// commands of one named step exit non-zero.
#[derive(Default)]
pub struct ScriptedExecutor {
    fail_step: Option<String>,
    commands: Mutex<Vec<Vec<String>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands belonging to `step` exit with code 1.
    pub fn failing_on(step: &str) -> Self {
        Self {
            fail_step: Some(step.to_string()),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Every command seen so far, in execution order.
    pub fn recorded(&self) -> Vec<Vec<String>> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl StepExecutor for ScriptedExecutor {
    async fn run(
        &self,
        step_name: &str,
        command: &[String],
        _cwd: &Path,
        _timeout_secs: u64,
    ) -> Result<CommandOutcome> {
        self.commands.lock().unwrap().push(command.to_vec());

        let fails = self.fail_step.as_deref() == Some(step_name);
        Ok(CommandOutcome {
            exit_code: if fails { 1 } else { 0 },
            stdout: String::new(),
            stderr: if fails {
                format!("scripted failure for step '{step_name}'")
            } else {
                String::new()
            },
            duration_ms: 0,
        })
    }
}

/// Fetcher that writes fixed bytes instead of downloading.
#[derive(Default)]
pub struct ScriptedFetcher {
    fetched: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs fetched so far, in order.
    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, dest: &Path, _expected_sha256: Option<&str>) -> Result<u64> {
        self.fetched.lock().unwrap().push(url.to_string());

        let bytes = b"scripted download";
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, bytes)?;
        Ok(bytes.len() as u64)
    }
}
