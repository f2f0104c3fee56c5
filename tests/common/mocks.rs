//! Mock HTTP configurations for integration tests.
//!
//! Re-exports the mock client from `spark_cloud::adapters::mock` and wraps
//! it in a small builder for the responses the cloud usually sends.

pub use spark_cloud::adapters::mock::{MockHttpClient, MockResponse};
pub use spark_cloud::traits::{Headers, HttpClient, HttpError, Response};

use bytes::Bytes;

/// Builder for a [`MockHttpClient`] with canned responses.
pub struct MockHttpConfig {
    client: MockHttpClient,
}

impl MockHttpConfig {
    pub fn new() -> Self {
        Self {
            client: MockHttpClient::new(),
        }
    }

    /// Answer `url` with a JSON body.
    pub fn with_json_response(self, url: &str, status: u16, json: serde_json::Value) -> Self {
        self.client.set_response(url, MockResponse::json(status, json));
        self
    }

    /// Fail requests to `url` at the transport level.
    #[allow(dead_code)]
    pub fn with_error_response(self, url: &str, error: HttpError) -> Self {
        self.client.set_response(url, MockResponse::Error(error));
        self
    }

    /// Answer `url` with an event stream made of `chunks`.
    #[allow(dead_code)]
    pub fn with_event_stream(self, url: &str, chunks: &[&str]) -> Self {
        let chunks = chunks
            .iter()
            .map(|c| Bytes::from(c.to_string()))
            .collect();
        self.client.set_response(url, MockResponse::Stream(chunks));
        self
    }

    /// Answer unmatched URLs with `status` and a plain body.
    #[allow(dead_code)]
    pub fn with_default_success(self, status: u16, body: &str) -> Self {
        self.client
            .set_default_response(MockResponse::Success(Response::new(
                status,
                Bytes::from(body.to_string()),
            )));
        self
    }

    pub fn build(self) -> MockHttpClient {
        self.client
    }
}

impl Default for MockHttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_http_config() {
        let client = MockHttpConfig::new()
            .with_json_response("https://api.example.com/v1/devices", 200, serde_json::json!([]))
            .build();

        assert!(client.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_mock_http_with_default() {
        let client = MockHttpConfig::new()
            .with_default_success(200, "OK")
            .build();

        let response = client
            .get("https://any-url.com/anything", &Headers::new())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
    }
}
