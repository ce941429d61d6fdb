//! Filesystem artifact store with git-style 2-char sharding.
//!
//! Layout: `<root>/objects/<first 2 hex chars>/<remaining hex chars>`
//!
//! Writes are atomic (temp file + rename), so a manifest only becomes
//! visible after a fully successful build. An aborted build leaves no
//! partial artifact behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::digest::Digest;
use crate::error::{KilnError, Result};

/// Content-addressed store for built artifact manifests.
pub struct FsArtifactStore {
    objects_dir: PathBuf,
}

impl FsArtifactStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let objects_dir = root.as_ref().join("objects");
        fs::create_dir_all(&objects_dir)?;
        Ok(Self { objects_dir })
    }

    fn blob_path(&self, digest: &Digest) -> PathBuf {
        let hex = digest.to_hex();
        self.objects_dir.join(&hex[..2]).join(&hex[2..])
    }

    /// Persist a blob, returning its digest. Idempotent for equal content.
    pub fn put(&self, data: &[u8]) -> Result<Digest> {
        let digest = Digest::compute(data);
        let path = self.blob_path(&digest);

        if path.exists() {
            return Ok(digest);
        }

        let shard_dir = path.parent().expect("blob path always has parent");
        fs::create_dir_all(shard_dir)?;

        let mut tmp = NamedTempFile::new_in(shard_dir)?;
        tmp.write_all(data)?;
        tmp.persist(&path).map_err(|e| KilnError::Io(e.error))?;

        Ok(digest)
    }

    /// Read a blob back by digest.
    pub fn get(&self, digest: &Digest) -> Result<Vec<u8>> {
        let path = self.blob_path(digest);
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KilnError::ArtifactNotFound(digest.to_hex())
            } else {
                KilnError::Io(e)
            }
        })
    }

    /// Whether a blob with this digest exists.
    pub fn exists(&self, digest: &Digest) -> bool {
        self.blob_path(digest).exists()
    }

    /// Number of stored blobs (walks the shard directories).
    pub fn len(&self) -> Result<usize> {
        let mut count = 0;
        for shard in fs::read_dir(&self.objects_dir)? {
            let shard = shard?;
            if shard.path().is_dir() {
                count += fs::read_dir(shard.path())?.count();
            }
        }
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
