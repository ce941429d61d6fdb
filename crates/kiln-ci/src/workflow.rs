//! Workflow definition and trigger evaluation.

use serde::{Deserialize, Serialize};

/// Repository event that may trigger a validation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerEvent {
    /// Commits pushed to a branch.
    Push { branch: String },

    /// A pull request opened or updated, regardless of target branch.
    PullRequest,
}

/// Declarative workflow: which events run which checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowDef {
    /// The branch whose pushes trigger validation.
    pub primary_branch: String,

    /// Ordered check names to run when triggered.
    pub checks: Vec<String>,
}

impl WorkflowDef {
    pub fn new(primary_branch: impl Into<String>, checks: Vec<String>) -> Self {
        Self {
            primary_branch: primary_branch.into(),
            checks,
        }
    }

    /// Whether this event triggers a validation run.
    ///
    /// Pushes trigger only on the primary branch; pull requests always
    /// trigger.
    pub fn should_run(&self, event: &TriggerEvent) -> bool {
        match event {
            TriggerEvent::Push { branch } => branch == &self.primary_branch,
            TriggerEvent::PullRequest => true,
        }
    }
}

impl Default for WorkflowDef {
    fn default() -> Self {
        Self::new(
            "main",
            crate::check::BuiltinCheck::all()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_to_primary_triggers() {
        let wf = WorkflowDef::default();
        assert!(wf.should_run(&TriggerEvent::Push {
            branch: "main".to_string()
        }));
    }

    #[test]
    fn push_to_other_branch_does_not_trigger() {
        let wf = WorkflowDef::default();
        assert!(!wf.should_run(&TriggerEvent::Push {
            branch: "feature/spark-tuning".to_string()
        }));
    }

    #[test]
    fn pull_request_always_triggers() {
        let wf = WorkflowDef::new("trunk", vec!["lint".to_string()]);
        assert!(wf.should_run(&TriggerEvent::PullRequest));
    }

    #[test]
    fn custom_primary_branch_respected() {
        let wf = WorkflowDef::new("trunk", vec!["lint".to_string()]);
        assert!(wf.should_run(&TriggerEvent::Push {
            branch: "trunk".to_string()
        }));
        assert!(!wf.should_run(&TriggerEvent::Push {
            branch: "main".to_string()
        }));
    }

    #[test]
    fn default_workflow_lists_builtin_checks() {
        let wf = WorkflowDef::default();
        assert_eq!(wf.checks, vec!["format", "docstyle", "lint"]);
    }

    #[test]
    fn trigger_event_json_shape() {
        let json = serde_json::to_value(TriggerEvent::Push {
            branch: "main".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "push");
        assert_eq!(json["branch"], "main");
    }
}
