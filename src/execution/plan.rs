use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("failed to read plan {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid plan json in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("plan validation failed: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(alias = "stepId")]
    pub step_id: u32,
    #[serde(rename = "agent", alias = "workerName")]
    pub worker_name: String,
    pub intent: String,
    #[serde(alias = "inputSource")]
    pub input_source: String,
}

impl PlanStep {
    pub fn new(step_id: u32, worker_name: &str, intent: &str, input_source: &str) -> Self {
        Self {
            step_id,
            worker_name: worker_name.to_string(),
            intent: intent.to_string(),
            input_source: input_source.to_string(),
        }
    }
}

/// Ordered steps produced by the planner. Declaration order is execution
/// order, independent of the numeric step ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    pub fn from_path(path: &Path) -> Result<Self, PlanError> {
        let raw = fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| PlanError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Structural checks for plans coming from outside the process. The engine
    /// itself executes any plan it is given.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.step_id) {
                return Err(PlanError::Invalid(format!(
                    "duplicate step id {}",
                    step.step_id
                )));
            }
            if step.worker_name.trim().is_empty() {
                return Err(PlanError::Invalid(format!(
                    "step {} has an empty worker name",
                    step.step_id
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
