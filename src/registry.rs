use crate::shared::ids::validate_identifier_value;
use crate::shared::serde_ext::deserialize_optional_trimmed;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("worker `{name}` not found in registry")]
    NotFound { name: String },
    #[error("failed to read registry {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid registry yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("registry validation failed: {0}")]
    Invalid(String),
}

/// Transport a worker is reached over. Unknown values are kept so that the
/// invocation layer can report them as configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum TransportKind {
    Http,
    Cli,
    Other(String),
}

impl TransportKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "http" => Self::Http,
            "cli" => Self::Cli,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Http => "http",
            Self::Cli => "cli",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for TransportKind {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<TransportKind> for String {
    fn from(value: TransportKind) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkerDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub intents: Vec<String>,
    #[serde(rename = "type")]
    pub transport: TransportKind,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_trimmed",
        skip_serializing_if = "Option::is_none"
    )]
    pub endpoint: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_trimmed",
        skip_serializing_if = "Option::is_none"
    )]
    pub command: Option<String>,
    /// Informational only; never polled.
    #[serde(
        default,
        deserialize_with = "deserialize_optional_trimmed",
        skip_serializing_if = "Option::is_none"
    )]
    pub healthcheck: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl WorkerDescriptor {
    pub fn http(name: &str, endpoint: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            intents: Vec::new(),
            transport: TransportKind::Http,
            endpoint: Some(endpoint.to_string()),
            command: None,
            healthcheck: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn cli(name: &str, command: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            intents: Vec::new(),
            transport: TransportKind::Cli,
            endpoint: None,
            command: Some(command.to_string()),
            healthcheck: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_intents(mut self, intents: &[&str]) -> Self {
        self.intents = intents.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn supports_intent(&self, intent: &str) -> bool {
        self.intents.iter().any(|v| v == intent)
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    workers: Vec<WorkerDescriptor>,
}

/// Read-only snapshot of the known workers.
///
/// The engine receives a `&WorkerRegistry` per execution; the snapshot can be
/// shared across threads without locking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerRegistry {
    workers: Vec<WorkerDescriptor>,
}

impl WorkerRegistry {
    pub fn new(workers: Vec<WorkerDescriptor>) -> Result<Self, RegistryError> {
        let registry = Self { workers };
        registry.validate()?;
        Ok(registry)
    }

    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let raw = fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let file: RegistryFile =
            serde_yaml::from_str(&raw).map_err(|source| RegistryError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Self::new(file.workers)
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for worker in &self.workers {
            validate_identifier_value("worker name", &worker.name)
                .map_err(RegistryError::Invalid)?;
            if !seen.insert(worker.name.as_str()) {
                return Err(RegistryError::Invalid(format!(
                    "duplicate worker name `{}`",
                    worker.name
                )));
            }
            if worker.timeout_ms == 0 {
                return Err(RegistryError::Invalid(format!(
                    "worker `{}` must declare a positive `timeout_ms`",
                    worker.name
                )));
            }
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&WorkerDescriptor, RegistryError> {
        self.workers
            .iter()
            .find(|worker| worker.name == name)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    pub fn workers(&self) -> &[WorkerDescriptor] {
        &self.workers
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
