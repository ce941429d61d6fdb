//! Download-step fetching with optional checksum verification.

use std::path::Path;

use async_trait::async_trait;
use sha2::{Digest as Sha2Digest, Sha256};

use crate::error::{BuildError, Result};

/// Fetches a download step's source into the staging directory.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` into `dest`, verifying `expected_sha256` when given.
    /// Returns the number of bytes written.
    async fn fetch(&self, url: &str, dest: &Path, expected_sha256: Option<&str>) -> Result<u64>;
}

/// Fetcher backed by an HTTP client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path, expected_sha256: Option<&str>) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| BuildError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BuildError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(expected) = expected_sha256 {
            verify_checksum(url, &bytes, expected)?;
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, &bytes)?;

        Ok(bytes.len() as u64)
    }
}

/// Compare fetched bytes against a declared SHA-256 hex digest.
pub fn verify_checksum(url: &str, bytes: &[u8], expected: &str) -> Result<()> {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let actual = hex::encode(hasher.finalize());

    if !actual.eq_ignore_ascii_case(expected) {
        return Err(BuildError::ChecksumMismatch {
            url: url.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
