//! Unified error type for the client.

use std::fmt;

use super::category::ErrorCategory;
use super::config::ConfigError;
use super::context::ErrorContext;
use super::network::NetworkError;
use super::stream::StreamError;

/// Every error a [`crate::SparkClient`] operation can return.
#[derive(Debug)]
pub enum SparkError {
    /// Transport failures and non-2xx replies.
    Network(NetworkError),

    /// Event-stream failures.
    Stream(StreamError),

    /// Missing or invalid configuration.
    Config(ConfigError),

    /// Wrapped error with additional context.
    WithContext {
        error: Box<SparkError>,
        context: ErrorContext,
    },
}

impl SparkError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SparkError::Network(err) => match err {
                NetworkError::HttpStatus { status: 401, .. } => ErrorCategory::Auth,
                NetworkError::HttpStatus { status, .. } if *status >= 500 => {
                    ErrorCategory::Server
                }
                NetworkError::RateLimited { .. } => ErrorCategory::Server,
                NetworkError::HttpStatus { .. } | NetworkError::InvalidUrl { .. } => {
                    ErrorCategory::Client
                }
                NetworkError::InvalidResponse { .. } => ErrorCategory::Protocol,
                _ => ErrorCategory::Network,
            },
            SparkError::Stream(err) => match err {
                StreamError::ConnectionLost { .. } => ErrorCategory::Network,
                StreamError::InvalidJson { .. }
                | StreamError::BufferOverflow { .. }
                | StreamError::UnsupportedSource { .. } => ErrorCategory::Protocol,
                StreamError::Other { .. } => ErrorCategory::Server,
            },
            SparkError::Config(_) => ErrorCategory::Configuration,
            SparkError::WithContext { error, .. } => error.category(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            SparkError::Network(err) => err.is_retryable(),
            SparkError::Stream(err) => err.is_retryable(),
            SparkError::Config(_) => false,
            SparkError::WithContext { error, .. } => error.is_retryable(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            SparkError::Network(err) => err.user_message(),
            SparkError::Stream(err) => err.user_message(),
            SparkError::Config(err) => err.user_message(),
            SparkError::WithContext { error, context } => {
                format!("{}\n\nContext: {}", error.user_message(), context)
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            SparkError::Network(err) => err.error_code(),
            SparkError::Stream(err) => err.error_code(),
            SparkError::Config(err) => err.error_code(),
            SparkError::WithContext { error, .. } => error.error_code(),
        }
    }

    pub fn with_context(self, ctx: ErrorContext) -> Self {
        SparkError::WithContext {
            error: Box::new(self),
            context: ctx,
        }
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            SparkError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// The error without any context wrappers.
    pub fn inner(&self) -> &SparkError {
        match self {
            SparkError::WithContext { error, .. } => error.inner(),
            _ => self,
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }

    /// Whether the access token needs replacing.
    pub fn requires_reauth(&self) -> bool {
        match self {
            SparkError::Network(NetworkError::HttpStatus { status: 401, .. }) => true,
            SparkError::Config(ConfigError::MissingAccessToken) => true,
            SparkError::WithContext { error, .. } => error.requires_reauth(),
            _ => false,
        }
    }

    /// HTTP status of the underlying reply, if the cloud answered.
    pub fn http_status(&self) -> Option<u16> {
        match self.inner() {
            SparkError::Network(NetworkError::HttpStatus { status, .. }) => Some(*status),
            SparkError::Network(NetworkError::RateLimited { .. }) => Some(429),
            _ => None,
        }
    }
}

impl fmt::Display for SparkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SparkError::Network(err) => write!(f, "{}", err),
            SparkError::Stream(err) => write!(f, "{}", err),
            SparkError::Config(err) => write!(f, "{}", err),
            SparkError::WithContext { error, context } => {
                write!(f, "{} ({})", error, context)
            }
        }
    }
}

impl std::error::Error for SparkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SparkError::Network(err) => Some(err),
            SparkError::Stream(err) => Some(err),
            SparkError::Config(err) => Some(err),
            SparkError::WithContext { error, .. } => error.source(),
        }
    }
}

impl From<NetworkError> for SparkError {
    fn from(err: NetworkError) -> Self {
        SparkError::Network(err)
    }
}

impl From<StreamError> for SparkError {
    fn from(err: StreamError) -> Self {
        SparkError::Stream(err)
    }
}

impl From<ConfigError> for SparkError {
    fn from(err: ConfigError) -> Self {
        SparkError::Config(err)
    }
}

impl From<serde_json::Error> for SparkError {
    fn from(err: serde_json::Error) -> Self {
        SparkError::Network(NetworkError::InvalidResponse {
            message: err.to_string(),
        })
    }
}
