use crate::context::InvocationContext;
use crate::invocation::WorkerInvoker;
use crate::protocol::{ErrorKind, InvocationResponse};
use crate::registry::WorkerRegistry;
use crate::resolver::resolve_input;
use crate::shared::ids::new_request_id;
use crate::shared::logging::append_execution_log;
use serde_json::{Map, Value};
use std::path::PathBuf;

pub mod outcome;
pub mod plan;

pub use outcome::{ExecutionOutcome, StepOutcomes, UsageEntry};
pub use plan::{Plan, PlanError, PlanStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    NotStarted,
    Running,
    Completed,
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Runs plans against a registry snapshot supplied per call.
#[derive(Debug, Clone, Default)]
pub struct PlanExecutor {
    invoker: WorkerInvoker,
    log_root: Option<PathBuf>,
}

impl PlanExecutor {
    pub fn new(invoker: WorkerInvoker) -> Self {
        Self {
            invoker,
            log_root: None,
        }
    }

    pub fn with_log_root(mut self, state_root: impl Into<PathBuf>) -> Self {
        self.log_root = Some(state_root.into());
        self
    }

    /// Attempts every step once, in declaration order. A failing step never
    /// stops the plan.
    pub fn execute(
        &self,
        original_query: &str,
        plan: &Plan,
        registry: &WorkerRegistry,
        context: &InvocationContext,
    ) -> ExecutionOutcome {
        let mut run = self.start(original_query, plan, registry, context);
        while run.advance().is_some() {}
        run.finish()
    }

    pub fn start<'a>(
        &'a self,
        original_query: &'a str,
        plan: &'a Plan,
        registry: &'a WorkerRegistry,
        context: &'a InvocationContext,
    ) -> PlanRun<'a> {
        PlanRun {
            executor: self,
            original_query,
            plan,
            registry,
            context,
            cursor: 0,
            state: ExecutionState::NotStarted,
            outcome: ExecutionOutcome::default(),
        }
    }

    fn log(&self, event: &str, fields: Map<String, Value>) {
        if let Some(root) = self.log_root.as_deref() {
            append_execution_log(root, "info", event, fields);
        }
    }
}

/// One plan execution, advanced a step at a time.
///
/// The outcome map and usage ledger belong to this run alone. A caller that
/// abandons the run stops calling [`PlanRun::advance`]; responses already
/// recorded are kept and nothing sent to a worker is undone.
#[derive(Debug)]
pub struct PlanRun<'a> {
    executor: &'a PlanExecutor,
    original_query: &'a str,
    plan: &'a Plan,
    registry: &'a WorkerRegistry,
    context: &'a InvocationContext,
    cursor: usize,
    state: ExecutionState,
    outcome: ExecutionOutcome,
}

impl<'a> PlanRun<'a> {
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn outcome(&self) -> &ExecutionOutcome {
        &self.outcome
    }

    pub fn remaining_steps(&self) -> usize {
        self.plan.steps.len().saturating_sub(self.cursor)
    }

    /// Executes the next step and returns its ledger entry, or `None` once the
    /// plan is complete.
    pub fn advance(&mut self) -> Option<&UsageEntry> {
        if self.state == ExecutionState::NotStarted {
            self.state = ExecutionState::Running;
            self.executor.log(
                "plan.started",
                Map::from_iter([("steps".to_string(), Value::from(self.plan.steps.len()))]),
            );
        }
        if self.state == ExecutionState::Completed {
            return None;
        }

        let plan = self.plan;
        let Some(step) = plan.steps.get(self.cursor) else {
            self.complete();
            return None;
        };
        self.cursor += 1;

        let registry = self.registry;
        let response = match registry.lookup(&step.worker_name) {
            Ok(descriptor) => {
                let text = resolve_input(
                    &step.input_source,
                    self.original_query,
                    &self.outcome.outcomes,
                );
                self.executor
                    .invoker
                    .invoke(descriptor, &step.intent, &text, self.context)
            }
            Err(err) => InvocationResponse::failure(
                &new_request_id(),
                &step.worker_name,
                ErrorKind::ConfigError,
                err.to_string(),
            ),
        };

        self.executor.log("step.completed", step_log_fields(step, &response));
        let status = response.status;
        self.outcome.outcomes.insert(step.step_id, response);
        self.outcome.usage.push(UsageEntry {
            worker_name: step.worker_name.clone(),
            intent: step.intent.clone(),
            status,
        });

        if self.cursor >= plan.steps.len() {
            self.complete();
        }
        self.outcome.usage.last()
    }

    /// Hands the accumulated outcome to the caller. Steps not yet advanced
    /// are never attempted.
    pub fn finish(self) -> ExecutionOutcome {
        self.outcome
    }

    fn complete(&mut self) {
        self.state = ExecutionState::Completed;
        self.executor.log(
            "plan.completed",
            Map::from_iter([
                (
                    "attempted".to_string(),
                    Value::from(self.outcome.usage.len()),
                ),
                (
                    "failed".to_string(),
                    Value::from(self.outcome.failed_workers().len()),
                ),
            ]),
        );
    }
}

fn step_log_fields(step: &PlanStep, response: &InvocationResponse) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("stepId".to_string(), Value::from(step.step_id));
    fields.insert(
        "worker".to_string(),
        Value::String(step.worker_name.clone()),
    );
    fields.insert("intent".to_string(), Value::String(step.intent.clone()));
    fields.insert(
        "requestId".to_string(),
        Value::String(response.request_id.clone()),
    );
    fields.insert(
        "status".to_string(),
        Value::String(response.status.to_string()),
    );
    if let Some(error) = &response.error {
        fields.insert(
            "errorKind".to_string(),
            Value::String(error.kind.to_string()),
        );
        fields.insert(
            "errorMessage".to_string(),
            Value::String(error.message.clone()),
        );
    }
    fields
}
