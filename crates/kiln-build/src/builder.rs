//! Build orchestration: ordered step execution and artifact persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use kiln_core::{obs, Digest, FsArtifactStore, ImageSpec, ProvisionStep};
use tracing::info;

use crate::error::{BuildError, Result};
use crate::executor::StepExecutor;
use crate::fetch::Fetcher;
use crate::lower::lower_step;
use crate::manifest::{version_env_key, ArtifactManifest, LayerRecord};

/// Default per-step time budget (30 minutes).
const DEFAULT_STEP_TIMEOUT_SECS: u64 = 1800;

/// A successfully built and persisted artifact.
#[derive(Debug, Clone)]
pub struct BuiltArtifact {
    /// Content digest of the manifest in the artifact store.
    pub digest: Digest,

    /// The manifest itself.
    pub manifest: ArtifactManifest,
}

/// Executes an [`ImageSpec`] step by step and persists the manifest.
///
/// Steps run strictly in declared order; the first failure aborts the
/// build. The staging directory is temporary, so an aborted build
/// retains no partial artifact — the store is only written after every
/// step has succeeded.
pub struct EnvironmentBuilder {
    executor: Arc<dyn StepExecutor>,
    fetcher: Arc<dyn Fetcher>,
    step_timeout_secs: u64,
}

impl EnvironmentBuilder {
    pub fn new(executor: Arc<dyn StepExecutor>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            executor,
            fetcher,
            step_timeout_secs: DEFAULT_STEP_TIMEOUT_SECS,
        }
    }

    /// Override the per-step time budget (0 = no timeout).
    pub fn with_step_timeout(mut self, secs: u64) -> Self {
        self.step_timeout_secs = secs;
        self
    }

    /// Build the spec and persist the manifest into `store`.
    pub async fn build(&self, spec: &ImageSpec, store: &FsArtifactStore) -> Result<BuiltArtifact> {
        spec.validate()?;
        let spec_digest = spec.digest()?;

        let _span = obs::BuildSpan::enter(&spec_digest);
        obs::emit_build_started(&spec_digest, &spec.base);
        let build_start = Instant::now();

        let staging = tempfile::tempdir()?;
        let mut layers = Vec::with_capacity(spec.steps.len());

        for step in &spec.steps {
            let layer = match self.run_step(step, spec, staging.path()).await {
                Ok(layer) => layer,
                Err(e) => {
                    obs::emit_build_finished(
                        &spec_digest,
                        false,
                        build_start.elapsed().as_millis() as u64,
                    );
                    return Err(e);
                }
            };
            obs::emit_step_finished(&layer.step, 0, layer.duration_ms);
            layers.push(layer);
        }

        let manifest = ArtifactManifest {
            base: spec.base.clone(),
            spec_digest: spec_digest.clone(),
            layers,
            env: baked_env(spec),
            pinned_versions: spec
                .pins
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            workdir: spec.workdir.clone(),
            created_at: Utc::now(),
        };

        let digest = store.put(&manifest.to_json_bytes()?)?;
        let duration_ms = build_start.elapsed().as_millis() as u64;
        obs::emit_build_finished(&spec_digest, true, duration_ms);
        info!(artifact = %digest.short(), duration_ms, "environment build complete");

        Ok(BuiltArtifact { digest, manifest })
    }

    async fn run_step(
        &self,
        step: &ProvisionStep,
        spec: &ImageSpec,
        staging: &Path,
    ) -> Result<LayerRecord> {
        let start = Instant::now();

        let detail = match step {
            ProvisionStep::Download { url, dest, sha256 } => {
                let target = staging_path(staging, dest);
                let bytes = self.fetcher.fetch(url, &target, sha256.as_deref()).await?;
                format!("{url} -> {dest} ({bytes} bytes)")
            }

            ProvisionStep::WriteFile { dest, contents } => {
                materialize_file(staging, dest, contents)?;
                format!(
                    "{dest} ({})",
                    Digest::compute(contents.as_bytes()).short()
                )
            }

            other => {
                let commands = lower_step(other, &spec.pins)?;
                for command in &commands {
                    let outcome = self
                        .executor
                        .run(other.name(), command, staging, self.step_timeout_secs)
                        .await?;
                    if !outcome.success() {
                        return Err(BuildError::StepFailed {
                            step: other.name().to_string(),
                            exit_code: outcome.exit_code,
                            stderr: outcome.stderr,
                        });
                    }
                }
                commands
                    .iter()
                    .map(|c| c.join(" "))
                    .collect::<Vec<_>>()
                    .join("; ")
            }
        };

        Ok(LayerRecord {
            step: step.name().to_string(),
            detail,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Render the lowered plan without executing anything.
    pub fn plan(spec: &ImageSpec) -> Result<Vec<String>> {
        spec.validate()?;

        let mut lines = vec![format!("FROM {}", spec.base)];
        for step in &spec.steps {
            match step {
                ProvisionStep::Download { url, dest, .. } => {
                    lines.push(format!("FETCH {url} -> {dest}"));
                }
                ProvisionStep::WriteFile { dest, contents } => {
                    lines.push(format!("WRITE {dest} ({} bytes)", contents.len()));
                }
                other => {
                    for command in lower_step(other, &spec.pins)? {
                        lines.push(format!("RUN {}", command.join(" ")));
                    }
                }
            }
        }
        for (key, value) in baked_env(spec) {
            lines.push(format!("ENV {key}={value}"));
        }
        lines.push(format!("WORKDIR {}", spec.workdir));
        Ok(lines)
    }
}

/// Environment baked into the artifact: one version variable per pin
/// plus the job-submission memory arguments.
fn baked_env(spec: &ImageSpec) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    for (library, version) in spec.pins.iter() {
        env.insert(version_env_key(library), version.to_string());
    }
    let (key, value) = spec.submit.to_env();
    env.insert(key, value);
    env
}

fn staging_path(staging: &Path, dest: &str) -> PathBuf {
    staging.join(dest.trim_start_matches('/'))
}

/// Write a declared file into the staging tree, truncating any prior
/// contents. Replaying the write reproduces the file byte for byte.
fn materialize_file(staging: &Path, dest: &str, contents: &str) -> Result<()> {
    let target = staging_path(staging, dest);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::SubmitConfig;

    #[test]
    fn plan_renders_default_recipe() {
        let spec = ImageSpec::genomics_default();
        let plan = EnvironmentBuilder::plan(&spec).unwrap();

        assert_eq!(plan[0], "FROM ubuntu:20.04");
        assert!(plan.iter().any(|l| l.starts_with("RUN apt-get update")));
        assert!(plan.iter().any(|l| l.contains("hail==0.2.122")));
        assert!(plan.iter().any(|l| l.starts_with("FETCH ")));
        assert!(plan
            .iter()
            .any(|l| l == "ENV HAIL_VERSION=0.2.122"));
        assert_eq!(plan.last().unwrap(), "WORKDIR /home");
    }

    #[test]
    fn baked_env_includes_submit_args() {
        let spec = ImageSpec::genomics_default();
        let env = baked_env(&spec);
        assert_eq!(
            env.get("PYSPARK_SUBMIT_ARGS").map(String::as_str),
            Some(SubmitConfig::default().submit_args().as_str())
        );
        assert_eq!(env.get("HAIL_VERSION").map(String::as_str), Some("0.2.122"));
    }

    #[test]
    fn materialize_file_is_replay_idempotent() {
        let staging = tempfile::tempdir().unwrap();
        let contents = "auth.enable true\nauth.keyfile /gsa-key/privateKeyData\n";

        materialize_file(staging.path(), "conf/defaults.conf", contents).unwrap();
        materialize_file(staging.path(), "conf/defaults.conf", contents).unwrap();

        let written =
            std::fs::read_to_string(staging.path().join("conf/defaults.conf")).unwrap();
        assert_eq!(written, contents);
        assert_eq!(
            written.lines().filter(|l| l.contains("auth.enable")).count(),
            1
        );
    }

    #[test]
    fn staging_path_strips_leading_slash() {
        let staging = Path::new("/tmp/stage");
        assert_eq!(
            staging_path(staging, "/etc/defaults.conf"),
            staging.join("etc/defaults.conf")
        );
    }
}
