use crate::protocol::{InvocationResponse, InvocationStatus};
use serde::{Deserialize, Serialize};

/// Step-indexed responses in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcomes {
    entries: Vec<(u32, InvocationResponse)>,
}

impl StepOutcomes {
    /// Records `response` for `step_id`. A repeated id replaces the earlier
    /// response and keeps its original position.
    pub fn insert(&mut self, step_id: u32, response: InvocationResponse) {
        match self.entries.iter_mut().find(|(id, _)| *id == step_id) {
            Some(entry) => entry.1 = response,
            None => self.entries.push((step_id, response)),
        }
    }

    pub fn get(&self, step_id: u32) -> Option<&InvocationResponse> {
        self.entries
            .iter()
            .find(|(id, _)| *id == step_id)
            .map(|(_, response)| response)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &InvocationResponse)> {
        self.entries.iter().map(|(id, response)| (*id, response))
    }

    pub fn step_ids(&self) -> Vec<u32> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One line of the per-step status timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    #[serde(rename = "name", alias = "workerName")]
    pub worker_name: String,
    pub intent: String,
    pub status: InvocationStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionOutcome {
    pub outcomes: StepOutcomes,
    pub usage: Vec<UsageEntry>,
}

impl ExecutionOutcome {
    /// Workers whose step produced no usable answer, in execution order.
    pub fn failed_workers(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, response)| !response.is_success())
            .map(|(_, response)| response.worker_name.as_str())
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|(_, response)| response.is_success())
    }
}
