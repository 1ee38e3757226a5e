use crate::shared::ids::new_conversation_id;
use crate::shared::logging::now_rfc3339;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const FILE_UPLOAD_MARKER_OPEN: &str = "[FILE_UPLOAD:";
pub const ANONYMOUS_USER_ID: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub base64_data: String,
    pub filename: String,
    pub mime_type: String,
}

/// Caller-supplied context forwarded verbatim to every worker.
///
/// Only `file_uploads` has meaning to the supervisor: the first attachment is
/// folded into the request metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationContext {
    #[serde(flatten)]
    pub values: BTreeMap<String, String>,
    #[serde(
        rename = "file_uploads",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub file_attachments: Vec<FileAttachment>,
}

impl InvocationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_attachment(mut self, attachment: FileAttachment) -> Self {
        self.file_attachments.push(attachment);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn first_attachment(&self) -> Option<&FileAttachment> {
        self.file_attachments.first()
    }
}

/// A user query ready for planning and execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuery {
    pub query_text: String,
    pub conversation_id: String,
    pub context: InvocationContext,
}

/// Removes `[FILE_UPLOAD:<payload>:<filename>:<mime>]` markers from a raw query.
///
/// Each marker is replaced with `[Uploaded file: <filename>]`. The payload may
/// be bare base64 or a `data:` URL, in which case only the part after the
/// comma is kept. Malformed markers are left in the text untouched.
pub fn extract_file_upload_markers(raw_query: &str) -> (String, Vec<FileAttachment>) {
    let mut text = String::new();
    let mut attachments = Vec::new();
    let mut cursor = raw_query;

    while let Some(start) = cursor.find(FILE_UPLOAD_MARKER_OPEN) {
        text.push_str(&cursor[..start]);
        let after_open = &cursor[start + FILE_UPLOAD_MARKER_OPEN.len()..];
        let Some(close) = after_open.find(']') else {
            text.push_str(&cursor[start..]);
            cursor = "";
            break;
        };
        let body = &after_open[..close];
        match parse_marker_body(body) {
            Some(attachment) => {
                text.push_str(&format!("[Uploaded file: {}]", attachment.filename));
                attachments.push(attachment);
            }
            None => {
                let marker_end = start + FILE_UPLOAD_MARKER_OPEN.len() + close + 1;
                text.push_str(&cursor[start..marker_end]);
            }
        }
        cursor = &after_open[close + 1..];
    }

    text.push_str(cursor);
    (text, attachments)
}

fn parse_marker_body(body: &str) -> Option<FileAttachment> {
    let (rest, mime_type) = body.rsplit_once(':')?;
    let (payload, filename) = rest.rsplit_once(':')?;
    if payload.is_empty() || filename.is_empty() || mime_type.is_empty() {
        return None;
    }
    let base64_data = if payload.starts_with("data:") {
        payload
            .split_once(',')
            .map(|(_, data)| data)
            .unwrap_or(payload)
    } else {
        payload
    };
    Some(FileAttachment {
        base64_data: base64_data.to_string(),
        filename: filename.to_string(),
        mime_type: mime_type.to_string(),
    })
}

/// Builds the execution context for one user request: `user_id`,
/// `conversation_id`, `timestamp` and any uploaded files found in the query.
pub fn prepare_query(
    raw_query: &str,
    user_id: Option<&str>,
    conversation_id: Option<&str>,
) -> PreparedQuery {
    let (query_text, attachments) = extract_file_upload_markers(raw_query);
    let conversation_id = conversation_id
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(new_conversation_id);
    let user_id = user_id
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS_USER_ID);

    let mut context = InvocationContext::new()
        .with_value("user_id", user_id)
        .with_value("conversation_id", &conversation_id)
        .with_value("timestamp", &now_rfc3339());
    context.file_attachments = attachments;

    PreparedQuery {
        query_text,
        conversation_id,
        context,
    }
}
