use crate::config::{load_global_settings, load_settings, ConfigError, Settings};
use crate::registry::WorkerRegistry;
use std::collections::BTreeMap;
use std::path::Path;

pub fn map_config_err(err: ConfigError) -> String {
    err.to_string()
}

pub fn load_settings_or_err(explicit: Option<&str>) -> Result<Settings, String> {
    match explicit {
        Some(path) => load_settings(Path::new(path)).map_err(map_config_err),
        None => load_global_settings().map_err(map_config_err),
    }
}

pub fn load_registry_or_err(settings: &Settings) -> Result<WorkerRegistry, String> {
    WorkerRegistry::from_path(&settings.registry_path).map_err(|e| e.to_string())
}

/// Parses `--flag value` pairs; every flag must be listed in `allowed`.
pub fn parse_flags(args: &[String], allowed: &[&str]) -> Result<BTreeMap<String, String>, String> {
    let mut flags = BTreeMap::new();
    let mut i = 0usize;
    while i < args.len() {
        let flag = args[i].as_str();
        if !allowed.contains(&flag) {
            return Err(format!("unexpected argument `{flag}`"));
        }
        if i + 1 >= args.len() {
            return Err(format!("{flag} requires a value"));
        }
        flags.insert(flag.trim_start_matches("--").to_string(), args[i + 1].clone());
        i += 2;
    }
    Ok(flags)
}
