//! Provisioning step definitions.

use serde::{Deserialize, Serialize};

/// A Python requirement: either pinned to an exact version or floating
/// to whatever the index resolves at build time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requirement {
    /// Distribution name as published on the package index.
    pub name: String,

    /// Exact version string, or `None` to float to latest at build time.
    pub pin: Option<String>,
}

impl Requirement {
    /// A requirement pinned to an exact version.
    pub fn pinned(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            pin: Some(version.to_string()),
        }
    }

    /// A requirement that floats to latest at build time.
    pub fn floating(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pin: None,
        }
    }

    /// Render as a pip requirement specifier (`name==ver` or bare `name`).
    pub fn specifier(&self) -> String {
        match &self.pin {
            Some(version) => format!("{}=={}", self.name, version),
            None => self.name.clone(),
        }
    }
}

/// One ordered provisioning step of an image build.
///
/// Steps are replay-idempotent: rebuilding from scratch reproduces the
/// same layer contents, modulo upstream index drift for floating
/// requirements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProvisionStep {
    /// Install OS-level packages (compilers, compression libraries).
    OsPackages { packages: Vec<String> },

    /// Install a Java runtime of a specific major version.
    JavaRuntime { major_version: u8 },

    /// Install the Python interpreter and its package manager.
    PythonToolchain {
        version: String,
        /// Upgrade pip to its latest release after installation.
        upgrade_pip: bool,
    },

    /// Install Python libraries (pinned anchor plus floating dependents).
    PythonPackages { requirements: Vec<Requirement> },

    /// Download a file into the image, optionally verifying its checksum.
    Download {
        url: String,
        dest: String,
        sha256: Option<String>,
    },

    /// Write a file with exact contents.
    ///
    /// Replaces the original edit-in-place substitution: the target file
    /// is created fresh, so the declared lines appear exactly once no
    /// matter how often the step is replayed.
    WriteFile { dest: String, contents: String },
}

impl ProvisionStep {
    /// Stable step name used in layer records and log lines.
    pub fn name(&self) -> &'static str {
        match self {
            ProvisionStep::OsPackages { .. } => "os_packages",
            ProvisionStep::JavaRuntime { .. } => "java_runtime",
            ProvisionStep::PythonToolchain { .. } => "python_toolchain",
            ProvisionStep::PythonPackages { .. } => "python_packages",
            ProvisionStep::Download { .. } => "download",
            ProvisionStep::WriteFile { .. } => "write_file",
        }
    }
}
