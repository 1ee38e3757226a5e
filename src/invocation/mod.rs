//! Worker invocation contract.
//!
//! [`WorkerInvoker::invoke`] always returns an [`InvocationResponse`]: every
//! transport, status, decoding and configuration failure is folded into an
//! error response instead of being returned to the caller. One attempt per
//! call; there is no retry.

use crate::config::{Settings, DEFAULT_LANGUAGE};
use crate::context::InvocationContext;
use crate::protocol::{
    ErrorKind, InvocationRequest, InvocationResponse, RequestInput, RequestMetadata,
    DEFAULT_FILENAME, DEFAULT_MIME_TYPE,
};
use crate::registry::{TransportKind, WorkerDescriptor};
use crate::shared::ids::new_request_id;
use std::sync::Arc;
use std::time::Duration;

pub mod transport;

pub use transport::{HttpReply, HttpTransport, TransportError, UreqTransport};

#[derive(Clone)]
pub struct WorkerInvoker {
    http: Option<Arc<dyn HttpTransport>>,
    language: String,
}

impl std::fmt::Debug for WorkerInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerInvoker")
            .field("http_available", &self.http.is_some())
            .field("language", &self.language)
            .finish()
    }
}

impl Default for WorkerInvoker {
    fn default() -> Self {
        Self::new(Some(Arc::new(UreqTransport::new())))
    }
}

impl WorkerInvoker {
    pub fn new(http: Option<Arc<dyn HttpTransport>>) -> Self {
        Self {
            http,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Invoker for a runtime without an HTTP client; HTTP workers report
    /// `config_error`.
    pub fn without_http() -> Self {
        Self::new(None)
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let invoker = if settings.http_enabled {
            Self::default()
        } else {
            Self::without_http()
        };
        invoker.with_language(&settings.language)
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn build_request(
        &self,
        descriptor: &WorkerDescriptor,
        intent: &str,
        text: &str,
        context: &InvocationContext,
    ) -> InvocationRequest {
        InvocationRequest {
            request_id: new_request_id(),
            worker_name: descriptor.name.clone(),
            intent: intent.to_string(),
            input: RequestInput {
                text: text.to_string(),
                metadata: build_metadata(&self.language, context),
            },
            context: context.clone(),
        }
    }

    pub fn invoke(
        &self,
        descriptor: &WorkerDescriptor,
        intent: &str,
        text: &str,
        context: &InvocationContext,
    ) -> InvocationResponse {
        let request = self.build_request(descriptor, intent, text, context);
        let endpoint = descriptor
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match (&descriptor.transport, endpoint, &self.http) {
            (TransportKind::Http, Some(endpoint), Some(http)) => {
                dispatch_http(http.as_ref(), descriptor, endpoint, &request)
            }
            (TransportKind::Http, _, None) => InvocationResponse::failure(
                &request.request_id,
                &descriptor.name,
                ErrorKind::ConfigError,
                "no HTTP client available for HTTP worker calls",
            ),
            (TransportKind::Cli, _, _) => InvocationResponse::failure(
                &request.request_id,
                &descriptor.name,
                ErrorKind::NotImplemented,
                "CLI worker execution is not implemented",
            ),
            (TransportKind::Http, None, Some(_)) => InvocationResponse::failure(
                &request.request_id,
                &descriptor.name,
                ErrorKind::ConfigError,
                "worker endpoint/command not configured",
            ),
            (TransportKind::Other(kind), _, _) => InvocationResponse::failure(
                &request.request_id,
                &descriptor.name,
                ErrorKind::ConfigError,
                format!("unsupported worker transport `{kind}`"),
            ),
        }
    }
}

/// Base language tag plus the first attachment only; further attachments stay
/// in the context but are not forwarded as metadata.
pub fn build_metadata(language: &str, context: &InvocationContext) -> RequestMetadata {
    let mut metadata = RequestMetadata::new(language);
    if let Some(first) = context.first_attachment() {
        metadata.file_base64 = Some(first.base64_data.clone());
        metadata.mime_type = Some(non_blank_or(&first.mime_type, DEFAULT_MIME_TYPE));
        metadata.filename = Some(non_blank_or(&first.filename, DEFAULT_FILENAME));
    }
    metadata
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

fn dispatch_http(
    http: &dyn HttpTransport,
    descriptor: &WorkerDescriptor,
    endpoint: &str,
    request: &InvocationRequest,
) -> InvocationResponse {
    let body = match serde_json::to_value(request) {
        Ok(body) => body,
        Err(err) => {
            return InvocationResponse::failure(
                &request.request_id,
                &descriptor.name,
                ErrorKind::ConfigError,
                format!("failed to encode request for {endpoint}: {err}"),
            )
        }
    };

    let reply = match http.post_json(endpoint, &body, Duration::from_millis(descriptor.timeout_ms))
    {
        Ok(reply) => reply,
        Err(err) => {
            return InvocationResponse::failure(
                &request.request_id,
                &descriptor.name,
                ErrorKind::NetworkError,
                err.to_string(),
            )
        }
    };

    if reply.status != 200 {
        return InvocationResponse::failure(
            &request.request_id,
            &descriptor.name,
            ErrorKind::HttpError,
            format!("HTTP {} calling {}", reply.status, endpoint),
        );
    }

    serde_json::from_str::<InvocationResponse>(&reply.body).unwrap_or_else(|err| {
        InvocationResponse::failure(
            &request.request_id,
            &descriptor.name,
            ErrorKind::ParseError,
            format!("invalid response body from {endpoint}: {err}"),
        )
    })
}
