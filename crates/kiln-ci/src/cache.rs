//! Content-keyed dependency cache for installed packages.
//!
//! Keys derive from the requirements manifests, so an unchanged
//! dependency set restores the exact cache entry. When the manifests
//! change, the newest existing entry is restored as a warm starting
//! point instead of installing from scratch.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{CiError, Result};

const KEY_PREFIX: &str = "pip-";

/// How a cache restore was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheHit {
    /// The requested key existed.
    Exact(String),

    /// The key was missing; the newest entry was restored instead.
    Fallback(String),
}

impl CacheHit {
    pub fn key(&self) -> &str {
        match self {
            CacheHit::Exact(k) | CacheHit::Fallback(k) => k,
        }
    }
}

/// Directory-backed dependency cache. One subdirectory per key.
pub struct DependencyCache {
    root: PathBuf,
}

impl DependencyCache {
    /// Open (or create) a cache rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Compute the cache key for a set of requirements manifests.
    ///
    /// The key hashes manifest contents in the given order, so any
    /// edit to any manifest produces a new key.
    pub fn key_for(&self, manifests: &[PathBuf]) -> Result<String> {
        let mut hasher = Sha256::new();
        for manifest in manifests {
            let bytes = fs::read(manifest).map_err(|e| {
                CiError::ManifestUnreadable(format!("{}: {e}", manifest.display()))
            })?;
            hasher.update(&bytes);
            hasher.update(b"\0");
        }
        Ok(format!("{KEY_PREFIX}{}", hex::encode(hasher.finalize())))
    }

    /// Restore a cache entry into `dest`.
    ///
    /// Prefers the exact key; falls back to the most recently stored
    /// entry when the key is absent. Returns `None` on a cold cache.
    pub fn restore(&self, key: &str, dest: &Path) -> Result<Option<CacheHit>> {
        let exact = self.root.join(key);
        if exact.is_dir() {
            copy_dir(&exact, dest)?;
            debug!(key = %key, "dependency cache exact hit");
            return Ok(Some(CacheHit::Exact(key.to_string())));
        }

        if let Some((fallback_key, path)) = self.newest_entry()? {
            copy_dir(&path, dest)?;
            debug!(key = %fallback_key, "dependency cache fallback hit");
            return Ok(Some(CacheHit::Fallback(fallback_key)));
        }

        debug!(key = %key, "dependency cache miss");
        Ok(None)
    }

    /// Store `src` under `key`. Idempotent for an existing key.
    pub fn store(&self, key: &str, src: &Path) -> Result<()> {
        let entry = self.root.join(key);
        if entry.exists() {
            return Ok(());
        }
        copy_dir(src, &entry)?;
        Ok(())
    }

    /// The most recently modified entry, if any.
    fn newest_entry(&self) -> Result<Option<(String, PathBuf)>> {
        let mut newest: Option<(SystemTime, String, PathBuf)> = None;

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(KEY_PREFIX) {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            let is_newer = newest.as_ref().map_or(true, |(t, _, _)| modified > *t);
            if is_newer {
                newest = Some((modified, name.to_string(), path));
            }
        }

        Ok(newest.map(|(_, name, path)| (name, path)))
    }
}

/// Recursively copy `src` into `dest`, creating `dest` as needed.
fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn key_is_stable_for_same_contents() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DependencyCache::open(dir.path().join("cache")).unwrap();
        let m = write_manifest(dir.path(), "requirements.txt", "hail==0.2.122\n");

        let k1 = cache.key_for(&[m.clone()]).unwrap();
        let k2 = cache.key_for(&[m]).unwrap();
        assert_eq!(k1, k2);
        assert!(k1.starts_with("pip-"));
    }

    #[test]
    fn key_changes_when_manifest_changes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DependencyCache::open(dir.path().join("cache")).unwrap();
        let m = write_manifest(dir.path(), "requirements.txt", "hail==0.2.122\n");

        let before = cache.key_for(&[m.clone()]).unwrap();
        fs::write(&m, "hail==0.2.123\n").unwrap();
        let after = cache.key_for(&[m]).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn unreadable_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DependencyCache::open(dir.path().join("cache")).unwrap();
        let missing = dir.path().join("no-such-requirements.txt");
        let err = cache.key_for(&[missing]).unwrap_err();
        assert!(matches!(err, CiError::ManifestUnreadable(_)));
    }

    #[test]
    fn cold_cache_restores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DependencyCache::open(dir.path().join("cache")).unwrap();
        let dest = dir.path().join("restored");

        let hit = cache.restore("pip-deadbeef", &dest).unwrap();
        assert_eq!(hit, None);
    }

    #[test]
    fn exact_hit_restores_stored_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DependencyCache::open(dir.path().join("cache")).unwrap();

        let src = dir.path().join("site-packages");
        fs::create_dir_all(src.join("hail")).unwrap();
        fs::write(src.join("hail/__init__.py"), "# hail\n").unwrap();

        cache.store("pip-abc", &src).unwrap();

        let dest = dir.path().join("restored");
        let hit = cache.restore("pip-abc", &dest).unwrap();
        assert_eq!(hit, Some(CacheHit::Exact("pip-abc".to_string())));
        assert!(dest.join("hail/__init__.py").exists());
    }

    #[test]
    fn missing_key_falls_back_to_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DependencyCache::open(dir.path().join("cache")).unwrap();

        let src = dir.path().join("site-packages");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("old.txt"), "old entry\n").unwrap();
        cache.store("pip-old", &src).unwrap();

        let dest = dir.path().join("restored");
        let hit = cache.restore("pip-new", &dest).unwrap();
        assert_eq!(hit, Some(CacheHit::Fallback("pip-old".to_string())));
        assert!(dest.join("old.txt").exists());
    }

    #[test]
    fn store_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DependencyCache::open(dir.path().join("cache")).unwrap();

        let src = dir.path().join("site-packages");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.txt"), "first\n").unwrap();
        cache.store("pip-abc", &src).unwrap();

        fs::write(src.join("a.txt"), "second\n").unwrap();
        cache.store("pip-abc", &src).unwrap();

        let dest = dir.path().join("restored");
        cache.restore("pip-abc", &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "first\n");
    }
}
