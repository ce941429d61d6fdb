//! Validation check definitions and configuration.

use serde::{Deserialize, Serialize};

/// Builtin source-tree checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinCheck {
    /// black --check .
    Format,

    /// pydocstyle .
    Docstyle,

    /// flake8 .
    Lint,
}

impl BuiltinCheck {
    /// Get the check name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinCheck::Format => "format",
            BuiltinCheck::Docstyle => "docstyle",
            BuiltinCheck::Lint => "lint",
        }
    }

    /// Get the check's command.
    pub fn command(&self) -> Vec<String> {
        match self {
            BuiltinCheck::Format => {
                vec!["black".to_string(), "--check".to_string(), ".".to_string()]
            }
            BuiltinCheck::Docstyle => vec!["pydocstyle".to_string(), ".".to_string()],
            BuiltinCheck::Lint => vec!["flake8".to_string(), ".".to_string()],
        }
    }

    /// All builtin checks in canonical pipeline order.
    pub fn all() -> [BuiltinCheck; 3] {
        [
            BuiltinCheck::Format,
            BuiltinCheck::Docstyle,
            BuiltinCheck::Lint,
        ]
    }
}

/// Configuration for a validation check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Human-readable check name.
    pub name: String,

    /// Command to execute (first element is executable).
    pub command: Vec<String>,

    /// Timeout in seconds (0 = no timeout).
    pub timeout_secs: u64,

    /// Whether this check is enabled.
    pub enabled: bool,
}

impl CheckConfig {
    /// Create a check configuration from a builtin check.
    pub fn from_builtin(check: BuiltinCheck, timeout_secs: u64) -> Self {
        Self {
            name: check.name().to_string(),
            command: check.command(),
            timeout_secs,
            enabled: true,
        }
    }

    /// Create a custom check configuration.
    pub fn custom(name: String, command: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            name,
            command,
            timeout_secs,
            enabled: true,
        }
    }

    /// Disable this check.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Result of a check execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Check name.
    pub check_name: String,

    /// Exit code (0 = success, -1 = execution error).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether execution succeeded.
    pub success: bool,
}

impl CheckResult {
    /// Whether this check passed (exit code 0).
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_check_names() {
        assert_eq!(BuiltinCheck::Format.name(), "format");
        assert_eq!(BuiltinCheck::Docstyle.name(), "docstyle");
        assert_eq!(BuiltinCheck::Lint.name(), "lint");
    }

    #[test]
    fn builtin_check_commands() {
        let fmt = BuiltinCheck::Format.command();
        assert_eq!(fmt[0], "black");
        assert!(fmt.contains(&"--check".to_string()));

        let lint = BuiltinCheck::Lint.command();
        assert_eq!(lint, vec!["flake8", "."]);

        let doc = BuiltinCheck::Docstyle.command();
        assert_eq!(doc[0], "pydocstyle");
    }

    #[test]
    fn all_builtin_checks_in_order() {
        let names: Vec<_> = BuiltinCheck::all().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["format", "docstyle", "lint"]);
    }

    #[test]
    fn check_config_from_builtin() {
        let config = CheckConfig::from_builtin(BuiltinCheck::Lint, 300);
        assert_eq!(config.name, "lint");
        assert_eq!(config.timeout_secs, 300);
        assert!(config.enabled);
    }

    #[test]
    fn check_config_disabled() {
        let config = CheckConfig::from_builtin(BuiltinCheck::Format, 300).disabled();
        assert!(!config.enabled);
    }

    #[test]
    fn check_result_passed() {
        let result = CheckResult {
            check_name: "format".to_string(),
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 100,
            success: true,
        };
        assert!(result.passed());
    }

    #[test]
    fn check_result_failed() {
        let result = CheckResult {
            check_name: "lint".to_string(),
            exit_code: 1,
            stdout: String::new(),
            stderr: "E501 line too long".to_string(),
            duration_ms: 100,
            success: false,
        };
        assert!(!result.passed());
    }
}
