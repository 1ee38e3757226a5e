use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LANGUAGE: &str = "en";

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_http_enabled() -> bool {
    true
}

/// Process-level settings for the supervisor.
///
/// `registry_path` is resolved against the settings file's directory when it
/// is relative. `state_root` enables the execution log; without it nothing is
/// written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    pub registry_path: PathBuf,
    #[serde(default)]
    pub state_root: Option<PathBuf>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_http_enabled")]
    pub http_enabled: bool,
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut settings: Settings =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        if settings.registry_path.is_relative() {
            if let Some(parent) = path.parent() {
                settings.registry_path = parent.join(&settings.registry_path);
            }
        }
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry_path.as_os_str().is_empty() {
            return Err(ConfigError::Settings(
                "`registry_path` must be non-empty".to_string(),
            ));
        }
        if let Some(state_root) = &self.state_root {
            if !state_root.is_absolute() {
                return Err(ConfigError::Settings(
                    "`state_root` must be an absolute path".to_string(),
                ));
            }
        }
        if self.language.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`language` must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}
