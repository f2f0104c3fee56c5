//! Configuration error types.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An authenticated operation was attempted without an access token.
    MissingAccessToken,

    /// The API base URL is empty or not http(s).
    InvalidBaseUrl { url: String },

    /// A buffer limit is zero or not a number.
    InvalidLimit { name: &'static str, value: String },
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::MissingAccessToken => {
                "No access token configured. Set SPARK_ACCESS_TOKEN.".to_string()
            }
            ConfigError::InvalidBaseUrl { url } => {
                format!("'{}' is not a valid API URL. Set SPARK_API_URL to an http(s) URL.", url)
            }
            ConfigError::InvalidLimit { name, value } => {
                format!("'{}' is not a valid value for {}; use a positive number.", value, name)
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::MissingAccessToken => "E_CFG_TOKEN",
            ConfigError::InvalidBaseUrl { .. } => "E_CFG_URL",
            ConfigError::InvalidLimit { .. } => "E_CFG_LIMIT",
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingAccessToken => write!(f, "Missing access token"),
            ConfigError::InvalidBaseUrl { url } => write!(f, "Invalid base URL: '{}'", url),
            ConfigError::InvalidLimit { name, value } => {
                write!(f, "Invalid {}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
