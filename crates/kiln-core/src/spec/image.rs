//! The image specification: the full declarative input of a build.

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::digest::compute_digest;
use crate::error::{KilnError, Result};
use crate::spec::pins::PinnedVersionSet;
use crate::spec::step::{ProvisionStep, Requirement};
use crate::spec::submit::SubmitConfig;

/// The genomics analysis library anchoring the pinned version set.
pub const ANCHOR_LIBRARY: &str = "hail";

/// The exact release every build must resolve the anchor to.
pub const ANCHOR_VERSION: &str = "0.2.122";

/// Declarative description of an environment image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageSpec {
    /// External base artifact to start from.
    pub base: String,

    /// Ordered provisioning steps; each failure is fatal to the build.
    pub steps: Vec<ProvisionStep>,

    /// Libraries that must resolve to exactly these versions.
    pub pins: PinnedVersionSet,

    /// Working directory baked into the artifact.
    pub workdir: String,

    /// Job-submission memory limits baked into the artifact environment.
    pub submit: SubmitConfig,
}

impl ImageSpec {
    /// Load a spec from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let spec: ImageSpec = serde_json::from_str(&content)?;
        Ok(spec)
    }

    /// SHA-256 over the spec's canonical JSON form.
    pub fn digest(&self) -> Result<String> {
        compute_digest(&serde_json::to_value(self)?)
    }

    /// Check structural invariants before a build is attempted.
    ///
    /// - base reference and steps must be non-empty
    /// - every pin is an exact version
    /// - every pinned requirement agrees with the pin set, and every
    ///   pin is carried by some requirement
    /// - every file destination stays inside the image root
    /// - memory limits are well-formed
    pub fn validate(&self) -> Result<()> {
        if self.base.trim().is_empty() {
            return Err(KilnError::InvalidSpec("base image is empty".to_string()));
        }
        if self.steps.is_empty() {
            return Err(KilnError::InvalidSpec("no provisioning steps".to_string()));
        }
        self.pins.validate()?;
        self.submit.validate()?;

        for step in &self.steps {
            match step {
                ProvisionStep::PythonPackages { requirements } => {
                    for req in requirements {
                        if let Some(pin) = &req.pin {
                            match self.pins.get(&req.name) {
                                Some(declared) if declared == pin.as_str() => {}
                                Some(declared) => {
                                    return Err(KilnError::InvalidSpec(format!(
                                        "requirement '{}' pinned to {} but pin set declares {}",
                                        req.name, pin, declared
                                    )));
                                }
                                None => {
                                    return Err(KilnError::InvalidSpec(format!(
                                        "requirement '{}' is pinned but absent from the pin set",
                                        req.name
                                    )));
                                }
                            }
                        }
                    }
                }
                ProvisionStep::Download { dest, .. } | ProvisionStep::WriteFile { dest, .. } => {
                    if dest.trim().is_empty() {
                        return Err(KilnError::InvalidSpec(
                            "file destination is empty".to_string(),
                        ));
                    }
                    let traverses = Path::new(dest)
                        .components()
                        .any(|c| matches!(c, Component::ParentDir));
                    if traverses {
                        return Err(KilnError::InvalidSpec(format!(
                            "destination '{dest}' escapes the image root"
                        )));
                    }
                }
                _ => {}
            }
        }

        for (library, _) in self.pins.iter() {
            let carried = self.steps.iter().any(|step| match step {
                ProvisionStep::PythonPackages { requirements } => {
                    requirements.iter().any(|r| r.name == library)
                }
                _ => false,
            });
            if !carried {
                return Err(KilnError::InvalidSpec(format!(
                    "pin '{library}' is not installed by any step"
                )));
            }
        }

        Ok(())
    }

    /// The built-in recipe for the genomics analysis environment.
    ///
    /// Mirrors the original provisioning sequence: Ubuntu base, native
    /// build and compression packages, OpenJDK 8 for the compute
    /// framework, Python 3 with pip upgraded, the pinned analysis
    /// library with its dependents floating, the cloud-storage
    /// connector with its two defaults lines, and the submission-shell
    /// memory limits.
    pub fn genomics_default() -> Self {
        let mut pins = PinnedVersionSet::new();
        pins.pin(ANCHOR_LIBRARY, ANCHOR_VERSION);

        ImageSpec {
            base: "ubuntu:20.04".to_string(),
            steps: vec![
                ProvisionStep::OsPackages {
                    packages: vec![
                        "build-essential".to_string(),
                        "curl".to_string(),
                        "git".to_string(),
                        "liblz4-dev".to_string(),
                        "libbz2-dev".to_string(),
                        "zlib1g-dev".to_string(),
                    ],
                },
                ProvisionStep::JavaRuntime { major_version: 8 },
                ProvisionStep::PythonToolchain {
                    version: "3.7".to_string(),
                    upgrade_pip: true,
                },
                ProvisionStep::PythonPackages {
                    requirements: vec![
                        Requirement::pinned(ANCHOR_LIBRARY, ANCHOR_VERSION),
                        Requirement::floating("scipy"),
                        Requirement::floating("statsmodels"),
                        Requirement::floating("tqdm"),
                    ],
                },
                ProvisionStep::Download {
                    url: "https://storage.googleapis.com/hadoop-lib/gcs/gcs-connector-hadoop2-latest.jar"
                        .to_string(),
                    dest: "spark/jars/gcs-connector.jar".to_string(),
                    sha256: None,
                },
                ProvisionStep::WriteFile {
                    dest: "spark/conf/spark-defaults.conf".to_string(),
                    contents: concat!(
                        "spark.hadoop.google.cloud.auth.service.account.enable true\n",
                        "spark.hadoop.google.cloud.auth.service.account.json.keyfile /gsa-key/privateKeyData\n",
                    )
                    .to_string(),
                },
            ],
            pins,
            workdir: "/home".to_string(),
            submit: SubmitConfig::default(),
        }
    }
}
