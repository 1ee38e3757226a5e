use overseer::context::InvocationContext;
use overseer::execution::{ExecutionState, Plan, PlanExecutor, PlanStep};
use overseer::invocation::{HttpReply, HttpTransport, TransportError, WorkerInvoker};
use overseer::protocol::{ErrorKind, InvocationStatus};
use overseer::registry::{WorkerDescriptor, WorkerRegistry};
use overseer::shared::logging::execution_log_path;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

#[derive(Debug, Clone)]
enum Scripted {
    Result(Value),
    Status(u16),
    Refused,
}

/// Replies per endpoint URL and records every request body in call order.
#[derive(Default)]
struct ScriptedTransport {
    replies: BTreeMap<String, Scripted>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    fn reply(mut self, url: &str, scripted: Scripted) -> Self {
        self.replies.insert(url.to_string(), scripted);
        self
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().expect("lock calls").clone()
    }

    fn texts_sent_to(&self, url: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(called, _)| called == url)
            .map(|(_, body)| body["input"]["text"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

impl HttpTransport for ScriptedTransport {
    fn post_json(
        &self,
        url: &str,
        body: &Value,
        _timeout: Duration,
    ) -> Result<HttpReply, TransportError> {
        self.calls
            .lock()
            .expect("lock calls")
            .push((url.to_string(), body.clone()));
        match self.replies.get(url) {
            Some(Scripted::Result(result)) => Ok(HttpReply {
                status: 200,
                body: json!({
                    "request_id": body["request_id"],
                    "agent_name": body["agent_name"],
                    "status": "success",
                    "output": {"result": result}
                })
                .to_string(),
            }),
            Some(Scripted::Status(status)) => Ok(HttpReply {
                status: *status,
                body: String::new(),
            }),
            Some(Scripted::Refused) | None => {
                Err(TransportError("connection refused".to_string()))
            }
        }
    }
}

fn url(name: &str) -> String {
    format!("http://workers.test/{name}")
}

fn registry(names: &[&str]) -> WorkerRegistry {
    WorkerRegistry::new(
        names
            .iter()
            .map(|name| WorkerDescriptor::http(name, &url(name)))
            .collect(),
    )
    .expect("registry")
}

fn executor(transport: &Arc<ScriptedTransport>) -> PlanExecutor {
    PlanExecutor::new(WorkerInvoker::new(Some(transport.clone())))
}

#[test]
fn step_result_flows_into_the_next_step() {
    let transport = Arc::new(
        ScriptedTransport::default()
            .reply(&url("workerA"), Scripted::Result(json!("Short summary")))
            .reply(&url("workerB"), Scripted::Result(json!("Follow-up drafted"))),
    );
    let plan = Plan::new(vec![
        PlanStep::new(1, "workerA", "summarize", "user_query"),
        PlanStep::new(2, "workerB", "followup", "step:1"),
    ]);

    let outcome = executor(&transport).execute(
        "Summarize the meeting and draft follow-ups",
        &plan,
        &registry(&["workerA", "workerB"]),
        &InvocationContext::new(),
    );

    assert_eq!(
        transport.texts_sent_to(&url("workerA")),
        vec!["Summarize the meeting and draft follow-ups".to_string()]
    );
    assert_eq!(
        transport.texts_sent_to(&url("workerB")),
        vec!["Short summary".to_string()]
    );
    assert_eq!(outcome.outcomes.step_ids(), vec![1, 2]);
    assert!(outcome.all_succeeded());
    assert_eq!(
        outcome
            .outcomes
            .get(2)
            .and_then(|response| response.result_text())
            .as_deref(),
        Some("Follow-up drafted")
    );
}

#[test]
fn ledger_follows_declaration_order_and_failures_do_not_stop_the_plan() {
    let transport = Arc::new(
        ScriptedTransport::default()
            .reply(&url("alpha"), Scripted::Result(json!("a")))
            .reply(&url("beta"), Scripted::Status(503))
            .reply(&url("gamma"), Scripted::Refused)
            .reply(&url("delta"), Scripted::Result(json!({"tasks": 3}))),
    );
    let plan = Plan::new(vec![
        PlanStep::new(30, "alpha", "one", "user_query"),
        PlanStep::new(10, "beta", "two", "user_query"),
        PlanStep::new(20, "gamma", "three", "step:10"),
        PlanStep::new(5, "delta", "four", "step:30.output.result"),
    ]);

    let outcome = executor(&transport).execute(
        "q",
        &plan,
        &registry(&["alpha", "beta", "gamma", "delta"]),
        &InvocationContext::new(),
    );

    let ledger: Vec<(&str, &str, InvocationStatus)> = outcome
        .usage
        .iter()
        .map(|entry| (entry.worker_name.as_str(), entry.intent.as_str(), entry.status))
        .collect();
    assert_eq!(
        ledger,
        vec![
            ("alpha", "one", InvocationStatus::Success),
            ("beta", "two", InvocationStatus::Error),
            ("gamma", "three", InvocationStatus::Error),
            ("delta", "four", InvocationStatus::Success),
        ]
    );
    assert_eq!(outcome.outcomes.step_ids(), vec![30, 10, 20, 5]);
    assert_eq!(
        outcome.outcomes.get(10).and_then(|r| r.error_kind()),
        Some(&ErrorKind::HttpError)
    );
    assert_eq!(
        outcome.outcomes.get(20).and_then(|r| r.error_kind()),
        Some(&ErrorKind::NetworkError)
    );
    assert_eq!(transport.texts_sent_to(&url("gamma")), vec!["q".to_string()]);
    assert_eq!(transport.texts_sent_to(&url("delta")), vec!["a".to_string()]);
    assert_eq!(outcome.failed_workers(), vec!["beta", "gamma"]);
}

#[test]
fn unknown_worker_records_config_error_and_continues() {
    let transport = Arc::new(
        ScriptedTransport::default().reply(&url("known"), Scripted::Result(json!("fine"))),
    );
    let plan = Plan::new(vec![
        PlanStep::new(1, "ghost_agent", "haunt", "user_query"),
        PlanStep::new(2, "known", "work", "step:1"),
    ]);

    let outcome = executor(&transport).execute(
        "original",
        &plan,
        &registry(&["known"]),
        &InvocationContext::new(),
    );

    assert_eq!(outcome.usage.len(), 2);
    let ghost = outcome.outcomes.get(1).expect("ghost outcome");
    assert_eq!(ghost.status, InvocationStatus::Error);
    assert_eq!(ghost.error_kind(), Some(&ErrorKind::ConfigError));
    assert_eq!(ghost.worker_name, "ghost_agent");
    assert!(ghost
        .error
        .as_ref()
        .is_some_and(|e| e.message.contains("ghost_agent")));
    assert_eq!(outcome.usage[0].status, InvocationStatus::Error);
    assert_eq!(
        transport.texts_sent_to(&url("known")),
        vec!["original".to_string()]
    );
    assert_eq!(transport.calls().len(), 1);
}

#[test]
fn mixed_transports_are_each_normalized() {
    let transport = Arc::new(ScriptedTransport::default());
    let registry = WorkerRegistry::new(vec![
        WorkerDescriptor::cli("local_tool", "run-tool"),
        WorkerDescriptor::http("remote", &url("remote")),
    ])
    .expect("registry");
    let plan = Plan::new(vec![
        PlanStep::new(1, "local_tool", "x", "user_query"),
        PlanStep::new(2, "remote", "y", "user_query"),
    ]);

    let outcome = PlanExecutor::new(WorkerInvoker::without_http()).execute(
        "q",
        &plan,
        &registry,
        &InvocationContext::new(),
    );

    assert_eq!(
        outcome.outcomes.get(1).and_then(|r| r.error_kind()),
        Some(&ErrorKind::NotImplemented)
    );
    assert_eq!(
        outcome.outcomes.get(2).and_then(|r| r.error_kind()),
        Some(&ErrorKind::ConfigError)
    );
    assert!(transport.calls().is_empty());
}

#[test]
fn step_wise_run_moves_through_states() {
    let transport = Arc::new(
        ScriptedTransport::default()
            .reply(&url("first"), Scripted::Result(json!("1")))
            .reply(&url("second"), Scripted::Result(json!("2"))),
    );
    let executor = executor(&transport);
    let registry = registry(&["first", "second"]);
    let context = InvocationContext::new();
    let plan = Plan::new(vec![
        PlanStep::new(1, "first", "a", "user_query"),
        PlanStep::new(2, "second", "b", "step:1"),
    ]);

    let mut run = executor.start("q", &plan, &registry, &context);
    assert_eq!(run.state(), ExecutionState::NotStarted);
    assert_eq!(run.remaining_steps(), 2);

    let entry = run.advance().expect("first step").clone();
    assert_eq!(entry.worker_name, "first");
    assert_eq!(run.state(), ExecutionState::Running);
    assert_eq!(run.outcome().usage.len(), 1);

    assert!(run.advance().is_some());
    assert_eq!(run.state(), ExecutionState::Completed);
    assert!(run.advance().is_none());

    let outcome = run.finish();
    assert_eq!(outcome.usage.len(), 2);
}

#[test]
fn abandoned_run_keeps_completed_steps_only() {
    let transport = Arc::new(
        ScriptedTransport::default()
            .reply(&url("first"), Scripted::Result(json!("1")))
            .reply(&url("second"), Scripted::Result(json!("2"))),
    );
    let executor = executor(&transport);
    let registry = registry(&["first", "second"]);
    let context = InvocationContext::new();
    let plan = Plan::new(vec![
        PlanStep::new(1, "first", "a", "user_query"),
        PlanStep::new(2, "second", "b", "user_query"),
    ]);

    let mut run = executor.start("q", &plan, &registry, &context);
    run.advance();
    let outcome = run.finish();

    assert_eq!(outcome.usage.len(), 1);
    assert_eq!(outcome.outcomes.step_ids(), vec![1]);
    assert!(transport.texts_sent_to(&url("second")).is_empty());
}

#[test]
fn empty_plan_completes_without_calls() {
    let transport = Arc::new(ScriptedTransport::default());
    let executor = executor(&transport);
    let registry = registry(&["first"]);
    let context = InvocationContext::new();
    let plan = Plan::default();

    let mut run = executor.start("q", &plan, &registry, &context);
    assert!(run.advance().is_none());
    assert_eq!(run.state(), ExecutionState::Completed);
    let outcome = run.finish();
    assert!(outcome.usage.is_empty());
    assert!(outcome.outcomes.is_empty());
    assert!(transport.calls().is_empty());
}

#[test]
fn concurrent_executions_share_one_registry_snapshot() {
    let transport = Arc::new(
        ScriptedTransport::default()
            .reply(&url("echo"), Scripted::Result(json!("echoed")))
            .reply(&url("relay"), Scripted::Result(json!("relayed"))),
    );
    let executor = executor(&transport);
    let registry = registry(&["echo", "relay"]);
    let plan = Plan::new(vec![
        PlanStep::new(1, "echo", "a", "user_query"),
        PlanStep::new(2, "relay", "b", "step:1"),
    ]);

    let outcomes = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|idx| {
                let executor = &executor;
                let registry = &registry;
                let plan = &plan;
                scope.spawn(move || {
                    let context =
                        InvocationContext::new().with_value("user_id", &format!("u{idx}"));
                    executor.execute(&format!("query {idx}"), plan, registry, &context)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("join execution"))
            .collect::<Vec<_>>()
    });

    assert_eq!(outcomes.len(), 4);
    for outcome in &outcomes {
        assert_eq!(outcome.usage.len(), 2);
        assert!(outcome.all_succeeded());
    }
    assert_eq!(transport.calls().len(), 8);
    let mut relayed = transport.texts_sent_to(&url("relay"));
    relayed.dedup();
    assert_eq!(relayed, vec!["echoed".to_string()]);
}

#[test]
fn execution_log_records_each_step_when_enabled() {
    let dir = tempdir().expect("tempdir");
    let transport = Arc::new(
        ScriptedTransport::default()
            .reply(&url("ok"), Scripted::Result(json!("fine")))
            .reply(&url("down"), Scripted::Status(500)),
    );
    let executor = executor(&transport).with_log_root(dir.path());
    let plan = Plan::new(vec![
        PlanStep::new(1, "ok", "a", "user_query"),
        PlanStep::new(2, "down", "b", "user_query"),
    ]);

    executor.execute(
        "q",
        &plan,
        &registry(&["ok", "down"]),
        &InvocationContext::new(),
    );

    let raw = fs::read_to_string(execution_log_path(dir.path())).expect("read log");
    let events: Vec<Value> = raw
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    let names: Vec<&str> = events
        .iter()
        .map(|event| event["event"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(
        names,
        vec!["plan.started", "step.completed", "step.completed", "plan.completed"]
    );
    assert_eq!(events[1]["status"], "success");
    assert_eq!(events[2]["stepId"], 2);
    assert_eq!(events[2]["errorKind"], "http_error");
    assert_eq!(events[3]["attempted"], 2);
    assert_eq!(events[3]["failed"], 1);
}
