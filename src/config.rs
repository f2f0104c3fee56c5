//! Client configuration.
//!
//! Built with `with_*` setters or read from `SPARK_*` environment
//! variables.

use crate::error::ConfigError;
use crate::sse::BufferLimits;

/// Default cloud API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.particle.io";

pub const ENV_API_URL: &str = "SPARK_API_URL";
pub const ENV_ACCESS_TOKEN: &str = "SPARK_ACCESS_TOKEN";
pub const ENV_MAX_BUFFERED_LINES: &str = "SPARK_MAX_BUFFERED_LINES";
pub const ENV_MAX_BUFFERED_BYTES: &str = "SPARK_MAX_BUFFERED_BYTES";
pub const ENV_STRICT_SOURCES: &str = "SPARK_STRICT_SOURCES";

/// Configuration for a [`crate::SparkClient`].
///
/// # Example
///
/// ```
/// use spark_cloud::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_base_url("http://localhost:8080")
///     .with_access_token("token")
///     .with_strict_sources(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, without a trailing slash
    pub base_url: String,
    pub access_token: Option<String>,
    /// Limits for every processor created by the client
    pub buffer_limits: BufferLimits,
    /// Fail instead of logging when a response is not an event stream
    pub strict_sources: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            buffer_limits: BufferLimits::default(),
            strict_sources: false,
        }
    }
}

// Keep the token out of debug output
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("buffer_limits", &self.buffer_limits)
            .field("strict_sources", &self.strict_sources)
            .finish()
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API root. Surrounding whitespace and trailing slashes are
    /// removed here, once.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_buffer_limits(mut self, limits: BufferLimits) -> Self {
        self.buffer_limits = limits;
        self
    }

    pub fn with_strict_sources(mut self, strict: bool) -> Self {
        self.strict_sources = strict;
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset variables. Unparseable numbers are ignored with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(url);
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN).filter(|v| !v.trim().is_empty()) {
            config = config.with_access_token(token.trim());
        }
        if let Some(lines) = parse_usize(&lookup, ENV_MAX_BUFFERED_LINES) {
            config.buffer_limits.max_lines = lines;
        }
        if let Some(bytes) = parse_usize(&lookup, ENV_MAX_BUFFERED_BYTES) {
            config.buffer_limits.max_bytes = bytes;
        }
        if let Some(strict) = lookup(ENV_STRICT_SOURCES) {
            config.strict_sources = matches!(
                strict.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }

        config
    }

    /// Check the base URL and limits.
    ///
    /// The URL is checked exactly as [`ClientConfig::url`] will use it, so a
    /// value with whitespace is rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.as_str();
        let has_host = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .map(|rest| !rest.is_empty() && !rest.chars().any(char::is_whitespace))
            .unwrap_or(false);
        if !has_host {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
            });
        }

        if self.buffer_limits.max_lines == 0 {
            return Err(ConfigError::InvalidLimit {
                name: "max_lines",
                value: "0".to_string(),
            });
        }
        if self.buffer_limits.max_bytes == 0 {
            return Err(ConfigError::InvalidLimit {
                name: "max_bytes",
                value: "0".to_string(),
            });
        }

        Ok(())
    }

    /// The access token, or `MissingAccessToken`.
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.access_token
            .as_deref()
            .ok_or(ConfigError::MissingAccessToken)
    }

    /// Join an API path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn parse_usize<F>(lookup: &F, key: &str) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<usize>() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
