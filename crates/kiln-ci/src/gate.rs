//! Gate evaluation over a finished validation run.

use serde::{Deserialize, Serialize};

use crate::check::CheckResult;

/// Gate evaluation verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateVerdict {
    /// Whether the gate passed.
    pub passed: bool,

    /// Violations that caused failure (empty if passed). Each
    /// violation names the offending check.
    pub violations: Vec<String>,

    /// Summary message.
    pub message: String,
}

/// Merge gate over check results.
pub struct Gate;

impl Gate {
    /// Evaluate whether every executed check passed.
    ///
    /// One violation per failed check; exit code -1 marks an execution
    /// error (the tool never produced a verdict).
    pub fn evaluate(results: &[CheckResult]) -> GateVerdict {
        let mut violations = Vec::new();

        for result in results {
            if result.passed() {
                continue;
            }
            if result.exit_code == -1 {
                violations.push(format!(
                    "check '{}' failed to execute: {}",
                    result.check_name,
                    result.stderr.trim()
                ));
            } else {
                violations.push(format!(
                    "check '{}' exited with code {}",
                    result.check_name, result.exit_code
                ));
            }
        }

        let passed = violations.is_empty();
        let message = if passed {
            "all checks passed".to_string()
        } else {
            format!("gate failed with {} violation(s)", violations.len())
        };

        GateVerdict {
            passed,
            violations,
            message,
        }
    }
}
