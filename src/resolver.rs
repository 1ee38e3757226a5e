use crate::execution::StepOutcomes;

/// Directive meaning "use the user's query as-is".
pub const ORIGINAL_QUERY_TOKEN: &str = "user_query";
pub const STEP_DIRECTIVE_PREFIX: &str = "step:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    OriginalQuery,
    /// `step:<id>[.<path>]`; the path is kept but never traversed.
    StepResult {
        step_id: u32,
        path: Option<String>,
    },
    Unrecognized(String),
}

impl InputSource {
    pub fn parse(raw: &str) -> Self {
        if raw == ORIGINAL_QUERY_TOKEN {
            return Self::OriginalQuery;
        }
        let Some(rest) = raw.strip_prefix(STEP_DIRECTIVE_PREFIX) else {
            return Self::Unrecognized(raw.to_string());
        };
        let reference = rest.split(':').next().unwrap_or_default();
        let (id, path) = match reference.split_once('.') {
            Some((id, path)) => (id, Some(path.to_string())),
            None => (reference, None),
        };
        match id.trim().parse::<u32>() {
            Ok(step_id) => Self::StepResult { step_id, path },
            Err(_) => Self::Unrecognized(raw.to_string()),
        }
    }
}

/// Turns a step's input directive into the text sent to its worker.
///
/// Never fails: a directive that cannot be satisfied (unknown step, failed
/// step, missing result, malformed reference) yields the original query.
pub fn resolve_input(directive: &str, original_query: &str, prior: &StepOutcomes) -> String {
    match InputSource::parse(directive) {
        InputSource::StepResult { step_id, .. } => prior
            .get(step_id)
            .and_then(|response| response.result_text())
            .unwrap_or_else(|| original_query.to_string()),
        InputSource::OriginalQuery | InputSource::Unrecognized(_) => original_query.to_string(),
    }
}
