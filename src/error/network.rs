//! Network-related error types.
//!
//! Covers transport failures and non-2xx replies from the cloud REST API.

use std::fmt;

use crate::traits::HttpError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Connection to the cloud failed.
    ConnectionFailed { url: String, message: String },

    /// Request timed out.
    Timeout { operation: String, message: String },

    /// Non-2xx response. `message` is the cloud's own error text when it
    /// sent one.
    HttpStatus { status: u16, message: String },

    /// Rate limited by the cloud (HTTP 429).
    RateLimited { message: String },

    /// The response body could not be decoded.
    InvalidResponse { message: String },

    /// The request URL could not be built.
    InvalidUrl { url: String },

    /// Request was cancelled.
    Cancelled,

    Other { message: String },
}

impl NetworkError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::ConnectionFailed { .. } => true,
            NetworkError::Timeout { .. } => true,
            NetworkError::HttpStatus { status, .. } => *status >= 500 || *status == 408,
            NetworkError::RateLimited { .. } => true,
            NetworkError::InvalidResponse { .. }
            | NetworkError::InvalidUrl { .. }
            | NetworkError::Cancelled
            | NetworkError::Other { .. } => false,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            NetworkError::ConnectionFailed { .. } => {
                "Unable to reach the cloud. Please check your internet connection.".to_string()
            }
            NetworkError::Timeout { operation, .. } => {
                format!("The {} request timed out.", operation)
            }
            NetworkError::HttpStatus { status, message } => match *status {
                400 => format!("The cloud rejected the request: {}", message),
                401 => "The access token was rejected. Please check SPARK_ACCESS_TOKEN.".to_string(),
                403 => "Access denied. The device may belong to another account.".to_string(),
                404 => "The device or resource was not found.".to_string(),
                500..=599 => "The cloud is experiencing issues. Please try again later.".to_string(),
                _ => format!("The cloud returned an error (HTTP {}): {}", status, message),
            },
            NetworkError::RateLimited { .. } => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            NetworkError::InvalidResponse { .. } => {
                "Received an invalid response from the cloud.".to_string()
            }
            NetworkError::InvalidUrl { url } => format!("Invalid request URL '{}'.", url),
            NetworkError::Cancelled => "The request was cancelled.".to_string(),
            NetworkError::Other { message } => format!("Network error: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed { .. } => "E_NET_CONN",
            NetworkError::Timeout { .. } => "E_NET_TIMEOUT",
            NetworkError::HttpStatus { .. } => "E_NET_HTTP",
            NetworkError::RateLimited { .. } => "E_NET_RATE",
            NetworkError::InvalidResponse { .. } => "E_NET_INVALID",
            NetworkError::InvalidUrl { .. } => "E_NET_URL",
            NetworkError::Cancelled => "E_NET_CANCEL",
            NetworkError::Other { .. } => "E_NET_OTHER",
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::ConnectionFailed { url, message } => {
                write!(f, "Connection failed to '{}': {}", url, message)
            }
            NetworkError::Timeout { operation, message } => {
                write!(f, "{} timed out: {}", operation, message)
            }
            NetworkError::HttpStatus { status, message } => {
                write!(f, "HTTP {} error: {}", status, message)
            }
            NetworkError::RateLimited { message } => write!(f, "Rate limited: {}", message),
            NetworkError::InvalidResponse { message } => {
                write!(f, "Invalid response: {}", message)
            }
            NetworkError::InvalidUrl { url } => write!(f, "Invalid URL: {}", url),
            NetworkError::Cancelled => write!(f, "Request cancelled"),
            NetworkError::Other { message } => write!(f, "Network error: {}", message),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Build the error for a non-2xx reply.
///
/// The cloud answers failures with `{"error": ..., "error_description": ...}`
/// (OAuth style) or `{"ok": false, "error": ...}`; the description is
/// preferred, then the error, then the raw body.
pub fn http_status_error(status: u16, body: &str) -> NetworkError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error_description", "error", "info"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {}", status)
            } else {
                trimmed.to_string()
            }
        });

    if status == 429 {
        NetworkError::RateLimited { message }
    } else {
        NetworkError::HttpStatus { status, message }
    }
}

/// Classify a transport error for `url` into a NetworkError.
pub fn classify_http_error(err: HttpError, url: &str) -> NetworkError {
    match err {
        HttpError::ConnectionFailed(message) | HttpError::Io(message) => {
            NetworkError::ConnectionFailed {
                url: url.to_string(),
                message,
            }
        }
        HttpError::Timeout(message) => NetworkError::Timeout {
            operation: format!("request to {}", url),
            message,
        },
        HttpError::ServerError { status, message } => http_status_error(status, &message),
        HttpError::Cancelled => NetworkError::Cancelled,
        HttpError::InvalidUrl(_) => NetworkError::InvalidUrl {
            url: url.to_string(),
        },
        HttpError::Other(message) => NetworkError::Other { message },
    }
}
