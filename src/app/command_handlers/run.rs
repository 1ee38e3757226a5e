use crate::app::command_support::{load_registry_or_err, load_settings_or_err, parse_flags};
use crate::context::prepare_query;
use crate::execution::{Plan, PlanExecutor};
use crate::invocation::WorkerInvoker;
use crate::report::ExecutionReport;
use serde_json::{Map, Value};
use std::path::Path;

const RUN_USAGE: &str =
    "usage: run --plan <path> --query <text> [--user <id>] [--conversation <id>] [--config <path>]";

pub fn cmd_run(args: &[String]) -> Result<String, String> {
    let flags = parse_flags(
        args,
        &["--plan", "--query", "--user", "--conversation", "--config"],
    )?;
    let plan_path = flags.get("plan").ok_or_else(|| RUN_USAGE.to_string())?;
    let raw_query = flags.get("query").ok_or_else(|| RUN_USAGE.to_string())?;
    if raw_query.trim().is_empty() {
        return Err("query cannot be empty".to_string());
    }

    let settings = load_settings_or_err(flags.get("config").map(String::as_str))?;
    let registry = load_registry_or_err(&settings)?;
    let plan = Plan::from_path(Path::new(plan_path)).map_err(|e| e.to_string())?;
    plan.validate().map_err(|e| e.to_string())?;

    let prepared = prepare_query(
        raw_query,
        flags.get("user").map(String::as_str),
        flags.get("conversation").map(String::as_str),
    );

    let mut executor = PlanExecutor::new(WorkerInvoker::from_settings(&settings));
    if let Some(state_root) = &settings.state_root {
        executor = executor.with_log_root(state_root);
    }
    let outcome = executor.execute(&prepared.query_text, &plan, &registry, &prepared.context);
    let report = ExecutionReport::from_outcome(&outcome);

    let mut payload = Map::new();
    payload.insert(
        "conversation_id".to_string(),
        Value::String(prepared.conversation_id),
    );
    payload.insert(
        "report".to_string(),
        serde_json::to_value(&report).map_err(|e| e.to_string())?,
    );
    serde_json::to_string_pretty(&Value::Object(payload)).map_err(|e| e.to_string())
}
