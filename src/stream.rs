use serde_json::{Value, json};

/// End-of-stream sentinel. Consumed here, never forwarded to the client.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Normalized unit emitted to the client: a content fragment, or exactly one
/// terminal error. Never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaEvent {
    Content(String),
    Error(String),
}

impl DeltaEvent {
    /// JSON payload placed in the `data:` field of one SSE frame.
    pub fn to_frame(&self) -> String {
        match self {
            DeltaEvent::Content(text) => json!({ "content": text }).to_string(),
            DeltaEvent::Error(message) => json!({ "error": message }).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Nothing to emit for this line; keep reading.
    Skip,
    /// End-of-stream sentinel reached; no further events follow.
    Done,
    /// One recognized content fragment.
    Delta(String),
}

/// Classify one raw line of the upstream body. Empty lines and lines that are
/// not `data:` fields (comments, event-name lines) yield nothing.
pub fn parse_line(line: &str) -> LineOutcome {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineOutcome::Skip;
    }
    match trimmed.strip_prefix("data:") {
        Some(payload) => parse_payload(payload.trim()),
        None => LineOutcome::Skip,
    }
}

/// Classify one event-data payload. Malformed JSON and unrecognized shapes
/// are skipped rather than surfaced; only the caller's transport errors are
/// fatal to the stream.
pub fn parse_payload(payload: &str) -> LineOutcome {
    if payload == DONE_SENTINEL {
        return LineOutcome::Done;
    }
    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(_) => return LineOutcome::Skip,
    };
    match extract_content(&value) {
        Some(text) if !text.is_empty() => LineOutcome::Delta(text),
        _ => LineOutcome::Skip,
    }
}

/// Two upstream payload shapes are recognized, discriminated by field
/// presence: chat-completion chunks (`choices[0].delta.content`) and the
/// legacy text-generation forms (`[0].generated_text` or `token.text`).
fn extract_content(value: &Value) -> Option<String> {
    if let Some(choices) = value.get("choices").and_then(|v| v.as_array()) {
        return choices
            .first()
            .and_then(|choice| choice.get("delta"))
            .and_then(|delta| delta.get("content"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
    }
    if let Some(generations) = value.as_array() {
        return generations
            .first()
            .and_then(|generation| generation.get("generated_text"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
    }
    if let Some(token) = value.get("token") {
        return token
            .get("text")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
    }
    None
}
