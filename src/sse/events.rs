//! SSE record types
//!
//! Contains the [`EventRecord`] emitted for every completed record, the
//! [`SseLine`] classification used while assembling records, and the
//! processor state/statistics types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// One device event reconstructed from the SSE stream.
///
/// `name` comes from the last `event:` line before the record's `data:`
/// line. Every other attribute is taken verbatim from the JSON object on
/// the `data:` line. A `name` key inside that object never survives: the
/// `event:` line always wins, and without one the record has no name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl EventRecord {
    /// Build a record from an optional event name and a parsed JSON object.
    pub fn new(name: Option<String>, mut fields: Map<String, Value>) -> Self {
        fields.remove("name");
        Self { name, fields }
    }

    /// The event name, if the record was preceded by an `event:` line.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Look up a payload attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The `data` attribute as a string (Particle events carry their
    /// payload as a string).
    pub fn data(&self) -> Option<&str> {
        self.fields.get("data").and_then(Value::as_str)
    }

    /// Time-to-live in seconds. The cloud sends it as a string.
    pub fn ttl(&self) -> Option<u64> {
        match self.fields.get("ttl")? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    /// Publication timestamp.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.fields.get("published_at")?.as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Id of the publishing device.
    pub fn coreid(&self) -> Option<&str> {
        self.fields.get("coreid").and_then(Value::as_str)
    }
}

/// Represents a parsed SSE line
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Event name declaration (e.g., "event: temperature")
    Event(String),
    /// Data payload, prefix stripped but otherwise untouched
    Data(String),
    /// Empty line
    Empty,
    /// Comment (`:` prefix) or a field this parser does not interpret
    Other(String),
}

/// Where the processor is in assembling the next record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    /// Nothing buffered since the last completed record.
    Idle,
    /// At least one line buffered, no `data:` line seen yet.
    Accumulating,
}

/// Counters kept by a processor over the life of a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    /// Records handed to the observer.
    pub records_emitted: u64,
    /// Records dropped because their payload was malformed.
    pub records_skipped: u64,
    /// Times a buffer limit was hit and the buffer reset.
    pub overflows: u64,
}
