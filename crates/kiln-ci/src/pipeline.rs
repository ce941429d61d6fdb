//! Validation pipeline orchestration.

use std::time::Instant;

use kiln_core::obs;
use tracing::info;
use uuid::Uuid;

use crate::check::{CheckConfig, CheckResult};
use crate::error::Result;
use crate::runner::CheckRunner;
use crate::spec::ValidationSpec;

/// Result of a complete validation run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Whether all executed checks passed.
    pub success: bool,

    /// Results of individual checks, in execution order.
    pub checks: Vec<CheckResult>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,

    /// Digest of the validation specification.
    pub spec_digest: String,
}

impl PipelineResult {
    /// Number of checks that passed.
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed()).count()
    }

    /// Number of checks that failed.
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed()).count()
    }
}

/// Validation pipeline orchestrator.
pub struct ValidationPipeline;

impl ValidationPipeline {
    /// Execute every enabled check against the spec's tree.
    ///
    /// All checks run to completion regardless of earlier failures, so
    /// one run reports every finding at once. An execution error
    /// (spawn failure, timeout) is folded into the run as a failed
    /// check with exit code -1 rather than aborting the remaining
    /// checks.
    pub async fn run(spec: &ValidationSpec, checks: Vec<CheckConfig>) -> Result<PipelineResult> {
        let start = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        let spec_digest = spec.digest();

        let _span = obs::RunSpan::enter(&run_id);
        obs::emit_run_started(&run_id, &spec.tree_path.to_string_lossy());

        let mut check_results = Vec::new();
        let mut all_passed = true;

        for config in checks {
            if !config.enabled {
                info!(check = %config.name, "skipping disabled check");
                continue;
            }

            info!(check = %config.name, "executing check");

            let check_start = Instant::now();
            let result = match CheckRunner::execute(&config, &spec.tree_path).await {
                Ok(r) => r,
                Err(e) => CheckResult {
                    check_name: config.name.clone(),
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: e.to_string(),
                    duration_ms: check_start.elapsed().as_millis() as u64,
                    success: false,
                },
            };

            if !result.passed() {
                all_passed = false;
            }
            obs::emit_check_finished(&run_id, &result.check_name, result.exit_code, result.passed());
            check_results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            passed = all_passed,
            duration_ms,
            "validation run finished"
        );

        Ok(PipelineResult {
            run_id,
            success: all_passed,
            checks: check_results,
            duration_ms,
            spec_digest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, exit_code: i32) -> CheckResult {
        CheckResult {
            check_name: name.to_string(),
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 100,
            success: exit_code == 0,
        }
    }

    #[test]
    fn pipeline_result_counts() {
        let pr = PipelineResult {
            run_id: "run123".to_string(),
            success: true,
            checks: vec![result("format", 0), result("lint", 0)],
            duration_ms: 300,
            spec_digest: "abc123".to_string(),
        };

        assert_eq!(pr.passed_count(), 2);
        assert_eq!(pr.failed_count(), 0);
        assert!(pr.success);
    }

    #[test]
    fn pipeline_result_with_failures() {
        let pr = PipelineResult {
            run_id: "run123".to_string(),
            success: false,
            checks: vec![result("format", 0), result("lint", 1)],
            duration_ms: 300,
            spec_digest: "abc123".to_string(),
        };

        assert_eq!(pr.passed_count(), 1);
        assert_eq!(pr.failed_count(), 1);
        assert!(!pr.success);
    }
}
