//! Dependency installation into a restorable directory.
//!
//! The validation environment's packages are installed into one
//! relocatable directory fed from the requirements manifests, so the
//! dependency cache has a concrete payload to store and restore.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{CiError, Result};

/// Materializes the validation environment's packages into `dest`.
///
/// The seam between the cache and the package manager: production runs
/// use [`PipInstaller`]; tests script their own installer so cache
/// round-trips never require a package index.
#[async_trait]
pub trait DepsInstaller: Send + Sync {
    /// Install every manifest's packages into `dest`.
    async fn install(&self, manifests: &[PathBuf], dest: &Path) -> Result<()>;
}

/// Installer backed by pip, targeting a relocatable directory.
pub struct PipInstaller;

impl PipInstaller {
    /// The lowered install command for a manifest set.
    pub fn command_for(manifests: &[PathBuf], dest: &Path) -> Vec<String> {
        let mut command = vec![
            "python3".to_string(),
            "-m".to_string(),
            "pip".to_string(),
            "install".to_string(),
            "--target".to_string(),
            dest.to_string_lossy().into_owned(),
        ];
        for manifest in manifests {
            command.push("-r".to_string());
            command.push(manifest.to_string_lossy().into_owned());
        }
        command
    }
}

#[async_trait]
impl DepsInstaller for PipInstaller {
    async fn install(&self, manifests: &[PathBuf], dest: &Path) -> Result<()> {
        std::fs::create_dir_all(dest)?;

        let command = Self::command_for(manifests, dest);
        let output = Command::new(&command[0])
            .args(&command[1..])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?
            .wait_with_output()
            .await?;

        if !output.status.success() {
            return Err(CiError::DepsInstallFailed {
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_targets_dest_and_lists_manifests() {
        let manifests = vec![
            PathBuf::from("requirements.txt"),
            PathBuf::from("dev-requirements.txt"),
        ];
        let command = PipInstaller::command_for(&manifests, Path::new(".pip-deps"));

        assert_eq!(command[0], "python3");
        assert!(command.windows(2).any(|w| w == ["--target", ".pip-deps"]));
        assert!(command.windows(2).any(|w| w == ["-r", "requirements.txt"]));
        assert!(command
            .windows(2)
            .any(|w| w == ["-r", "dev-requirements.txt"]));
    }

    #[test]
    fn command_without_manifests_has_no_requirement_flags() {
        let command = PipInstaller::command_for(&[], Path::new("deps"));
        assert!(!command.iter().any(|a| a == "-r"));
    }
}
