//! Request and response envelopes exchanged with worker services.
//!
//! Keys follow the workers' snake_case wire format. When reading responses the
//! camelCase spellings (`requestId`, `workerName`, `kind`) are accepted too.

use crate::context::InvocationContext;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
pub const DEFAULT_FILENAME: &str = "uploaded_file";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    #[serde(alias = "requestId")]
    pub request_id: String,
    #[serde(rename = "agent_name", alias = "workerName")]
    pub worker_name: String,
    pub intent: String,
    pub input: RequestInput,
    pub context: InvocationContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestInput {
    pub text: String,
    pub metadata: RequestMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub language: String,
    #[serde(default)]
    pub extra: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl RequestMetadata {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            extra: Map::new(),
            file_base64: None,
            mime_type: None,
            filename: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    Success,
    Error,
}

impl InvocationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure category reported on an error response.
///
/// Workers may report their own categories; those are preserved as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorKind {
    HttpError,
    NetworkError,
    ConfigError,
    NotImplemented,
    ParseError,
    Other(String),
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::HttpError => "http_error",
            Self::NetworkError => "network_error",
            Self::ConfigError => "config_error",
            Self::NotImplemented => "not_implemented",
            Self::ParseError => "parse_error",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for ErrorKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "http_error" => Self::HttpError,
            "network_error" => Self::NetworkError,
            "config_error" => Self::ConfigError,
            "not_implemented" => Self::NotImplemented,
            "parse_error" => Self::ParseError,
            _ => Self::Other(value),
        }
    }
}

impl From<ErrorKind> for String {
    fn from(value: ErrorKind) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationError {
    #[serde(rename = "type", alias = "kind")]
    pub kind: ErrorKind,
    #[serde(default)]
    pub message: String,
}

/// Worker result value, checked when the response is decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultValue {
    Text(String),
    Number(serde_json::Number),
    Structured(Value),
}

impl ResultValue {
    /// Text handed to a downstream step. Non-text values are rendered as
    /// compact JSON.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => number.to_string(),
            Self::Structured(value) => value.to_string(),
        }
    }
}

impl From<&str> for ResultValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationOutput {
    #[serde(default)]
    pub result: Option<ResultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl InvocationOutput {
    pub fn text(result: &str) -> Self {
        Self {
            result: Some(ResultValue::from(result)),
            confidence: None,
            details: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(alias = "requestId")]
    pub request_id: String,
    #[serde(rename = "agent_name", alias = "workerName")]
    pub worker_name: String,
    pub status: InvocationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<InvocationOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<InvocationError>,
}

impl InvocationResponse {
    pub fn success(request_id: &str, worker_name: &str, output: InvocationOutput) -> Self {
        Self {
            request_id: request_id.to_string(),
            worker_name: worker_name.to_string(),
            status: InvocationStatus::Success,
            output: Some(output),
            error: None,
        }
    }

    pub fn failure(
        request_id: &str,
        worker_name: &str,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.to_string(),
            worker_name: worker_name.to_string(),
            status: InvocationStatus::Error,
            output: None,
            error: Some(InvocationError {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == InvocationStatus::Success && self.output.is_some()
    }

    pub fn error_kind(&self) -> Option<&ErrorKind> {
        self.error.as_ref().map(|error| &error.kind)
    }

    /// Result text of a successful response; `None` for failures and for
    /// successes that carry no result.
    pub fn result_text(&self) -> Option<String> {
        if !self.is_success() {
            return None;
        }
        self.output
            .as_ref()
            .and_then(|output| output.result.as_ref())
            .map(ResultValue::as_text)
    }
}
