//! Error category classification.
//!
//! Coarse grouping of errors used for retry decisions and for the hint
//! printed next to an error in the CLI.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection, DNS, timeout, or a dropped event stream.
    /// Generally transient and retryable.
    Network,

    /// The cloud rejected the access token.
    Auth,

    /// Cloud-side failures (HTTP 5xx, rate limiting).
    /// Generally transient and retryable after delay.
    Server,

    /// The request was wrong: unknown device, bad argument, 4xx.
    Client,

    /// The cloud sent data the client could not interpret.
    Protocol,

    /// Missing or invalid client configuration.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Short label for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::Protocol => "protocol",
            ErrorCategory::Configuration => "configuration",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Network connectivity issue",
            ErrorCategory::Auth => "Authentication problem",
            ErrorCategory::Server => "Cloud-side issue",
            ErrorCategory::Client => "Request rejected",
            ErrorCategory::Protocol => "Unexpected data from the cloud",
            ErrorCategory::Configuration => "Configuration problem",
        }
    }

    /// Suggested recovery action for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check your internet connection and try again",
            ErrorCategory::Auth => "Check that SPARK_ACCESS_TOKEN holds a valid access token",
            ErrorCategory::Server => {
                "The cloud may be experiencing issues. Please try again later"
            }
            ErrorCategory::Client => "Check the device id and arguments and try again",
            ErrorCategory::Protocol => {
                "Check that SPARK_API_URL points at a Spark/Particle compatible cloud"
            }
            ErrorCategory::Configuration => "Check your SPARK_* environment variables",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
