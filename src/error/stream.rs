//! Event-stream error types.
//!
//! Errors raised while opening or consuming a device event stream. Parse
//! and overflow errors never end a stream: the processor logs them and
//! moves on.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The transport failed mid-stream.
    ConnectionLost { message: String },

    /// A `data:` payload was not a JSON object.
    InvalidJson { event_type: String, message: String },

    /// A buffer hit its configured limit and was reset.
    BufferOverflow { buffer: &'static str, limit: usize },

    /// The response cannot be consumed as an event stream.
    UnsupportedSource { reason: String },

    /// Generic stream error.
    Other { message: String },
}

impl StreamError {
    /// Check if the stream can be reopened.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StreamError::ConnectionLost { .. })
    }

    /// Whether the error ends the stream, as opposed to dropping one record.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StreamError::ConnectionLost { .. } | StreamError::UnsupportedSource { .. }
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            StreamError::ConnectionLost { .. } => {
                "The connection to the event stream was lost.".to_string()
            }
            StreamError::InvalidJson { event_type, .. } => {
                format!("Received an unreadable '{}' event; it was skipped.", event_type)
            }
            StreamError::BufferOverflow { buffer, limit } => {
                format!(
                    "An event was too large ({} limit {}) and was dropped.",
                    buffer, limit
                )
            }
            StreamError::UnsupportedSource { reason } => {
                format!("The server did not return an event stream: {}", reason)
            }
            StreamError::Other { message } => format!("Stream error: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::ConnectionLost { .. } => "E_STREAM_CONN",
            StreamError::InvalidJson { .. } => "E_STREAM_JSON",
            StreamError::BufferOverflow { .. } => "E_STREAM_OVERFLOW",
            StreamError::UnsupportedSource { .. } => "E_STREAM_SOURCE",
            StreamError::Other { .. } => "E_STREAM_OTHER",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::ConnectionLost { message } => {
                write!(f, "Stream connection lost: {}", message)
            }
            StreamError::InvalidJson {
                event_type,
                message,
            } => {
                write!(f, "Invalid JSON for {} event: {}", event_type, message)
            }
            StreamError::BufferOverflow { buffer, limit } => {
                write!(f, "Buffer overflow in {} (limit {})", buffer, limit)
            }
            StreamError::UnsupportedSource { reason } => {
                write!(f, "Unsupported stream source: {}", reason)
            }
            StreamError::Other { message } => write!(f, "Stream error: {}", message),
        }
    }
}

impl std::error::Error for StreamError {}
