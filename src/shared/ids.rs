pub fn validate_identifier_value(kind: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{kind} must be non-empty"));
    }
    if value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.')
    {
        return Ok(());
    }
    Err(format!(
        "{kind} must use only ASCII letters, digits, '-', '_' or '.'"
    ))
}

/// Fresh id for one worker call.
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn new_conversation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
