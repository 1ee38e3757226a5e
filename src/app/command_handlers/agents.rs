use crate::app::command_support::{load_registry_or_err, load_settings_or_err, parse_flags};
use crate::registry::WorkerDescriptor;

pub fn cmd_agents(args: &[String]) -> Result<String, String> {
    let flags = parse_flags(args, &["--config"])?;
    let settings = load_settings_or_err(flags.get("config").map(String::as_str))?;
    let registry = load_registry_or_err(&settings)?;
    if registry.is_empty() {
        return Ok("no workers registered".to_string());
    }
    Ok(registry
        .workers()
        .iter()
        .map(describe_worker)
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn describe_worker(worker: &WorkerDescriptor) -> String {
    let target = match (&worker.endpoint, &worker.command) {
        (Some(endpoint), _) => format!("endpoint={endpoint}"),
        (None, Some(command)) => format!("command={command}"),
        (None, None) => "endpoint=<unset>".to_string(),
    };
    format!(
        "name={} transport={} {} timeout_ms={} intents={}",
        worker.name,
        worker.transport,
        target,
        worker.timeout_ms,
        worker.intents.join(",")
    )
}
