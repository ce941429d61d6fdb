//! Kiln Core Library
//!
//! Domain types shared by the environment builder and the validation
//! pipeline: the declarative image specification, canonical digests,
//! the content-addressed artifact store, and telemetry setup.

pub mod digest;
pub mod error;
pub mod obs;
pub mod spec;
pub mod store;
pub mod telemetry;

pub use digest::{canonical_json, compute_digest, Digest};
pub use error::{KilnError, Result};
pub use obs::{
    emit_build_finished, emit_build_started, emit_check_finished, emit_gate_evaluated,
    emit_run_started, emit_step_finished, BuildSpan, RunSpan,
};
pub use spec::{
    ImageSpec, PinnedVersionSet, ProvisionStep, Requirement, SubmitConfig, ANCHOR_LIBRARY,
    ANCHOR_VERSION,
};
pub use store::FsArtifactStore;
pub use telemetry::init_tracing;

/// Kiln version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
