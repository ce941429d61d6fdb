//! Validation run identity.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identity of a validation run.
///
/// Two runs with the same check list and head ref validate the same
/// thing; their digests are equal. The tree path is where the checks
/// execute, not part of the identity, so the digest survives a
/// relocated checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationSpec {
    /// Source tree root path.
    pub tree_path: PathBuf,

    /// SHA-256 digest of ordered check names (deterministic).
    pub checks_digest: String,

    /// Ref under validation (commit SHA or branch, "unknown" outside a
    /// repository).
    pub head_ref: String,
}

impl ValidationSpec {
    /// Create a new validation specification.
    pub fn new(tree_path: PathBuf, checks: &[String], head_ref: String) -> Self {
        let checks_digest = compute_checks_digest(checks);
        Self {
            tree_path,
            checks_digest,
            head_ref,
        }
    }

    /// Combined digest over the check list and head ref.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.checks_digest.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.head_ref.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Compute deterministic digest of ordered check names.
fn compute_checks_digest(checks: &[String]) -> String {
    let mut hasher = Sha256::new();
    for check in checks {
        hasher.update(check.as_bytes());
        hasher.update(b"\0");
    }
    hex::encode(hasher.finalize())
}
