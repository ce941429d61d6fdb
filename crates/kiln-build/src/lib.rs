//! Kiln Build - Environment Builder
//!
//! Materializes a declarative [`kiln_core::ImageSpec`] into an
//! immutable artifact:
//! - lowers provisioning steps to concrete commands and executes them
//!   in declared order inside a staging directory
//! - any step failure is fatal; no partial artifact is retained
//! - on success, persists a content-addressed build manifest recording
//!   every layer, the pinned versions, and the baked environment

pub mod builder;
pub mod error;
pub mod executor;
pub mod fakes;
pub mod fetch;
pub mod lower;
pub mod manifest;

pub use builder::{BuiltArtifact, EnvironmentBuilder};
pub use error::{BuildError, Result};
pub use executor::{CommandOutcome, ShellExecutor, StepExecutor};
pub use fetch::{Fetcher, HttpFetcher};
pub use lower::lower_step;
pub use manifest::{ArtifactManifest, LayerRecord};
