use crate::app::cli::{help_text, parse_cli_verb, CliVerb};

pub mod agents;
pub mod run;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Agents => agents::cmd_agents(&args[1..]),
        CliVerb::Run => run::cmd_run(&args[1..]),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}
