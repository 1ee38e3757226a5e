#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Agents,
    Run,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "agents" => CliVerb::Agents,
        "run" => CliVerb::Run,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  agents [--config <path>]             List workers known to the registry".to_string(),
        "  run --plan <path> --query <text>     Execute a plan and print the execution report"
            .to_string(),
        "      [--user <id>] [--conversation <id>] [--config <path>]".to_string(),
        "  help                                 Show this help".to_string(),
        String::new(),
        "Environment:".to_string(),
        "  OVERSEER_CONFIG                      Settings file (default ~/.overseer/config.yaml)"
            .to_string(),
    ]
}

pub fn help_text() -> String {
    cli_help_lines().join("\n")
}
