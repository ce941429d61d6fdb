//! Build failure taxonomy.
//!
//! Every variant is fatal: provisioning defines no retry, and an
//! aborted build discards its staging directory.

use thiserror::Error;

/// Errors that can abort an environment build.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A lowered command exited non-zero
    #[error("step '{step}' failed with exit code {exit_code}: {stderr}")]
    StepFailed {
        step: String,
        exit_code: i32,
        stderr: String,
    },

    /// A step had nothing to execute
    #[error("step '{0}' has an empty command")]
    EmptyCommand(String),

    /// A step exceeded its time budget
    #[error("step '{step}' timed out after {timeout_secs}s")]
    Timeout { step: String, timeout_secs: u64 },

    /// A download step could not fetch its source
    #[error("download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Fetched bytes did not match the declared checksum
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    /// Spec validation, pin, or store error from the domain layer
    #[error(transparent)]
    Core(#[from] kiln_core::KilnError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for build operations
pub type Result<T> = std::result::Result<T, BuildError>;
