//! The build manifest: the immutable record of a finished build.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One materialized layer of the artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayerRecord {
    /// Step name (`os_packages`, `download`, ...).
    pub step: String,

    /// What was materialized: the lowered command, the fetched URL, or
    /// the written path.
    pub detail: String,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Immutable record of a successful environment build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactManifest {
    /// Base image the build started from.
    pub base: String,

    /// Digest of the image spec that produced this artifact.
    pub spec_digest: String,

    /// Layers in materialization order.
    pub layers: Vec<LayerRecord>,

    /// Environment baked into the artifact: one version variable per
    /// pinned library plus the job-submission memory arguments.
    pub env: BTreeMap<String, String>,

    /// The pinned version set the build resolved to.
    pub pinned_versions: BTreeMap<String, String>,

    /// Working directory baked into the artifact.
    pub workdir: String,

    /// When the build finished.
    pub created_at: DateTime<Utc>,
}

impl ArtifactManifest {
    /// Pretty JSON bytes as persisted to the artifact store.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse a manifest back from stored bytes.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Environment variable carrying a pinned library's baked version,
/// e.g. `hail` -> `HAIL_VERSION`.
pub fn version_env_key(library: &str) -> String {
    format!(
        "{}_VERSION",
        library.to_uppercase().replace(['-', '.'], "_")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_env_key_normalizes() {
        assert_eq!(version_env_key("hail"), "HAIL_VERSION");
        assert_eq!(version_env_key("gcs-connector"), "GCS_CONNECTOR_VERSION");
    }

    #[test]
    fn manifest_json_roundtrip() {
        let manifest = ArtifactManifest {
            base: "ubuntu:20.04".into(),
            spec_digest: "abc".into(),
            layers: vec![LayerRecord {
                step: "os_packages".into(),
                detail: "apt-get update".into(),
                duration_ms: 10,
            }],
            env: BTreeMap::from([("HAIL_VERSION".to_string(), "0.2.122".to_string())]),
            pinned_versions: BTreeMap::from([("hail".to_string(), "0.2.122".to_string())]),
            workdir: "/home".into(),
            created_at: Utc::now(),
        };

        let bytes = manifest.to_json_bytes().unwrap();
        let back = ArtifactManifest::from_json_bytes(&bytes).unwrap();
        assert_eq!(back, manifest);
    }
}
