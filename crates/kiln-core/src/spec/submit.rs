//! Job-submission memory configuration baked into the artifact.
//!
//! The distributed-compute framework reads its driver/executor memory
//! limits from an environment variable consumed by its submission
//! shell. This is modeled as an explicit struct rendered at build time
//! rather than ambient global state.

use serde::{Deserialize, Serialize};

use crate::error::{KilnError, Result};

/// Environment variable read by the job-submission shell.
pub const SUBMIT_ARGS_ENV: &str = "PYSPARK_SUBMIT_ARGS";

/// Driver/executor memory limits for the job-submission shell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitConfig {
    /// Driver memory limit, e.g. `8g`.
    pub driver_memory: String,

    /// Executor memory limit, e.g. `8g`.
    pub executor_memory: String,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            driver_memory: "8g".to_string(),
            executor_memory: "8g".to_string(),
        }
    }
}

impl SubmitConfig {
    /// Render the submission-shell arguments baked into the artifact.
    pub fn submit_args(&self) -> String {
        format!(
            "--driver-memory {} --executor-memory {} pyspark-shell",
            self.driver_memory, self.executor_memory
        )
    }

    /// The environment variable pair baked into the artifact.
    pub fn to_env(&self) -> (String, String) {
        (SUBMIT_ARGS_ENV.to_string(), self.submit_args())
    }

    /// Memory limits must be digits followed by a `g` or `m` unit.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("driver_memory", &self.driver_memory),
            ("executor_memory", &self.executor_memory),
        ] {
            if !is_memory_limit(value) {
                return Err(KilnError::InvalidSpec(format!(
                    "{field} '{value}' is not a memory limit (expected e.g. '8g')"
                )));
            }
        }
        Ok(())
    }
}

fn is_memory_limit(value: &str) -> bool {
    let Some(unit) = value.chars().last() else {
        return false;
    };
    if !matches!(unit, 'g' | 'm') {
        return false;
    }
    let digits = &value[..value.len() - 1];
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_renders_eight_gig_shell_args() {
        let cfg = SubmitConfig::default();
        assert_eq!(
            cfg.submit_args(),
            "--driver-memory 8g --executor-memory 8g pyspark-shell"
        );
    }

    #[test]
    fn env_pair_uses_submit_args_variable() {
        let (key, value) = SubmitConfig::default().to_env();
        assert_eq!(key, SUBMIT_ARGS_ENV);
        assert!(value.ends_with("pyspark-shell"));
    }

    #[test]
    fn validate_accepts_units() {
        let cfg = SubmitConfig {
            driver_memory: "16g".into(),
            executor_memory: "512m".into(),
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_garbage() {
        for bad in ["8", "g", "", "8gb", "eight-g"] {
            let cfg = SubmitConfig {
                driver_memory: bad.into(),
                executor_memory: "8g".into(),
            };
            assert!(cfg.validate().is_err(), "expected rejection of {bad:?}");
        }
    }
}
