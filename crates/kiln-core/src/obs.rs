//! Structured observability hooks for build and pipeline lifecycle events.
//!
//! Events are emitted at `info!` level; filtering follows `RUST_LOG`.

use tracing::info;

/// RAII guard entering a build-scoped tracing span.
pub struct BuildSpan {
    _span: tracing::span::EnteredSpan,
}

impl BuildSpan {
    /// Create and enter a span tagged with the spec digest.
    pub fn enter(spec_digest: &str) -> Self {
        let span = tracing::info_span!("kiln.build", spec_digest = %spec_digest);
        Self {
            _span: span.entered(),
        }
    }
}

/// RAII guard entering a validation-run-scoped tracing span.
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("kiln.validate", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: environment build started.
pub fn emit_build_started(spec_digest: &str, base: &str) {
    info!(event = "build.started", spec_digest = %spec_digest, base = %base);
}

/// Emit event: one provisioning step completed.
pub fn emit_step_finished(step: &str, exit_code: i32, duration_ms: u64) {
    info!(
        event = "build.step_finished",
        step = %step,
        exit_code = exit_code,
        duration_ms = duration_ms,
    );
}

/// Emit event: build finished (success or aborted).
pub fn emit_build_finished(spec_digest: &str, success: bool, duration_ms: u64) {
    info!(
        event = "build.finished",
        spec_digest = %spec_digest,
        success = success,
        duration_ms = duration_ms,
    );
}

/// Emit event: validation run started.
pub fn emit_run_started(run_id: &str, tree: &str) {
    info!(event = "validate.started", run_id = %run_id, tree = %tree);
}

/// Emit event: one validation check completed.
pub fn emit_check_finished(run_id: &str, check: &str, exit_code: i32, passed: bool) {
    info!(
        event = "validate.check_finished",
        run_id = %run_id,
        check = %check,
        exit_code = exit_code,
        passed = passed,
    );
}

/// Emit event: gate verdict computed.
pub fn emit_gate_evaluated(run_id: &str, passed: bool, violations: usize) {
    info!(
        event = "gate.evaluated",
        run_id = %run_id,
        passed = passed,
        violations = violations,
    );
}
