//! Error types for the validation pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CiError>;

#[derive(Debug, Error)]
pub enum CiError {
    #[error("check '{check}' has an empty command")]
    EmptyCommand { check: String },

    #[error("check '{check}' timed out after {timeout_secs} seconds")]
    Timeout { check: String, timeout_secs: u64 },

    #[error("failed to spawn check '{check}': {source}")]
    Spawn {
        check: String,
        #[source]
        source: std::io::Error,
    },

    #[error("requirements manifest not readable: {0}")]
    ManifestUnreadable(String),

    #[error("dependency install failed with exit code {exit_code}: {stderr}")]
    DepsInstallFailed { exit_code: i32, stderr: String },

    #[error(transparent)]
    Core(#[from] kiln_core::KilnError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
