//! Line and record parsing
//!
//! Stateless helpers used by the processor: classifying a single trimmed
//! line, and turning a completed run of buffered lines into an
//! [`EventRecord`].

use serde_json::Value;

use crate::error::StreamError;
use crate::sse::events::{EventRecord, SseLine};

pub const EVENT_PREFIX: &str = "event:";
pub const DATA_PREFIX: &str = "data:";

/// Parse a single SSE line into its component type.
///
/// Prefixes are matched case-sensitively and need no space after the colon.
/// The `event:` value is trimmed; the `data:` value is returned as-is so the
/// JSON parser sees exactly what was sent.
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(rest) = line.strip_prefix(EVENT_PREFIX) {
        return SseLine::Event(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix(DATA_PREFIX) {
        return SseLine::Data(rest.to_string());
    }

    SseLine::Other(line.to_string())
}

/// Check whether a trimmed line completes a record.
pub fn is_data_line(line: &str) -> bool {
    line.starts_with(DATA_PREFIX)
}

/// Parse the payload of a `data:` line. Only JSON objects are accepted.
pub fn parse_payload(
    event_name: Option<&str>,
    payload: &str,
) -> Result<serde_json::Map<String, Value>, StreamError> {
    let label = event_name.unwrap_or("<unnamed>").to_string();
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StreamError::InvalidJson {
            event_type: label,
            message: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
        Err(e) => Err(StreamError::InvalidJson {
            event_type: label,
            message: e.to_string(),
        }),
    }
}

/// Run the record-completion procedure over the buffered lines.
///
/// The candidate name follows every `event:` line in order; the first
/// `data:` line produces the record. Lines after it are ignored, which never
/// happens for buffers assembled by the processor since it completes on the
/// `data:` line itself.
pub fn complete_record(lines: &[String]) -> Result<Option<EventRecord>, StreamError> {
    let mut name: Option<String> = None;

    for line in lines {
        match parse_sse_line(line) {
            SseLine::Event(event_name) => name = Some(event_name),
            SseLine::Data(payload) => {
                let fields = parse_payload(name.as_deref(), &payload)?;
                return Ok(Some(EventRecord::new(name, fields)));
            }
            SseLine::Empty | SseLine::Other(_) => {}
        }
    }

    Ok(None)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
