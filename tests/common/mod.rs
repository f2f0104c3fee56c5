//! Common test utilities for integration tests.
//!
//! # Example
//!
//! ```ignore
//! mod common;
//! use common::{mock_client, MockHttpConfig};
//!
//! let http = MockHttpConfig::new().build();
//! let client = mock_client(http.clone());
//! ```

pub mod mocks;

pub use mocks::*;

use std::sync::Arc;

use spark_cloud::{ClientConfig, SparkClient};

pub const TEST_BASE_URL: &str = "https://cloud.test";
pub const TEST_TOKEN: &str = "test-access-token-12345";

/// Configuration pointing at `base_url` with a test token.
pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig::new()
        .with_base_url(base_url)
        .with_access_token(TEST_TOKEN)
}

/// A client backed by `http`, rooted at [`TEST_BASE_URL`].
#[allow(dead_code)]
pub fn mock_client(http: MockHttpClient) -> SparkClient {
    SparkClient::with_http_client(test_config(TEST_BASE_URL), Arc::new(http))
        .expect("test config is valid")
}

/// Full URL for `path` under [`TEST_BASE_URL`].
#[allow(dead_code)]
pub fn test_url(path: &str) -> String {
    format!("{}{}", TEST_BASE_URL, path)
}

/// Split `text` into chunks of at most `size` bytes, on char boundaries.
#[allow(dead_code)]
pub fn split_every(text: &str, size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if current.len() + c.len_utf8() > size && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_is_valid() {
        let config = test_config(TEST_BASE_URL);
        assert!(config.validate().is_ok());
        assert_eq!(config.token().unwrap(), TEST_TOKEN);
    }

    #[test]
    fn test_split_every_keeps_text() {
        let text = "data: {\"é\":1}\n";
        let chunks = split_every(text, 3);
        assert!(chunks.iter().all(|c| c.len() <= 3));
        assert_eq!(chunks.concat(), text);
    }
}
