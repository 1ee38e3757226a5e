use crate::execution::{ExecutionOutcome, UsageEntry};
use serde::Serialize;
use serde_json::{Map, Value};

/// Hand-off shape for the answer synthesizer and status timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    pub used_agents: Vec<UsageEntry>,
    /// `step_<id>` to the serialized worker response.
    pub intermediate_results: Map<String, Value>,
    pub failed_workers: Vec<String>,
}

impl ExecutionReport {
    pub fn from_outcome(outcome: &ExecutionOutcome) -> Self {
        let mut intermediate_results = Map::new();
        for (step_id, response) in outcome.outcomes.iter() {
            let value = serde_json::to_value(response).unwrap_or_else(|err| {
                Value::String(format!("failed to serialize step response: {err}"))
            });
            intermediate_results.insert(format!("step_{step_id}"), value);
        }

        Self {
            used_agents: outcome.usage.clone(),
            intermediate_results,
            failed_workers: outcome
                .failed_workers()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    /// One `<n>. <worker> (<intent>): <status>` line per attempted step.
    pub fn timeline_lines(&self) -> Vec<String> {
        self.used_agents
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                format!(
                    "{}. {} ({}): {}",
                    idx + 1,
                    entry.worker_name,
                    entry.intent,
                    entry.status
                )
            })
            .collect()
    }
}
