//! Kiln CI - source-tree validation pipeline
//!
//! Provides the validation gate in front of the environment recipes:
//! - Executes formatting, docstring, and lint checks against a tree
//! - Runs every check to completion and aggregates all findings
//! - Evaluates a merge gate over the aggregated results
//! - Installs and caches dependencies keyed on requirements manifests

pub mod cache;
pub mod check;
pub mod deps;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod runner;
pub mod spec;
pub mod workflow;

// Re-export key types
pub use cache::{CacheHit, DependencyCache};
pub use check::{BuiltinCheck, CheckConfig, CheckResult};
pub use deps::{DepsInstaller, PipInstaller};
pub use error::{CiError, Result};
pub use gate::{Gate, GateVerdict};
pub use pipeline::{PipelineResult, ValidationPipeline};
pub use runner::CheckRunner;
pub use spec::ValidationSpec;
pub use workflow::{TriggerEvent, WorkflowDef};
