//! Error types for kiln-core

use thiserror::Error;

/// Errors produced by domain-level operations.
#[derive(Error, Debug)]
pub enum KilnError {
    /// Image specification failed validation
    #[error("invalid image spec: {0}")]
    InvalidSpec(String),

    /// A pinned version contained a floating specifier
    #[error("pin violation for '{library}': '{spec}' is not an exact version")]
    PinViolation { library: String, spec: String },

    /// Requested artifact does not exist in the store
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// Digest string could not be parsed
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for kiln-core operations
pub type Result<T> = std::result::Result<T, KilnError>;
