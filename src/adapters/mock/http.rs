//! Mock HTTP client for testing.
//!
//! Returns predefined responses or errors per URL and records every
//! request for later inspection.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::sse::EVENT_STREAM_CONTENT_TYPE;
use crate::traits::{Headers, HttpClient, HttpError, Method, Response, StreamingResponse};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    /// Request body, if one was sent
    pub body: Option<String>,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a buffered response
    Success(Response),
    /// Fail the request
    Error(HttpError),
    /// Return an event stream with these chunks
    Stream(Vec<Bytes>),
    /// Return a stream with an explicit content type
    TypedStream {
        content_type: String,
        chunks: Vec<Bytes>,
    },
    /// Return these chunks, then fail mid-stream
    StreamError {
        chunks: Vec<Bytes>,
        error: HttpError,
    },
}

impl MockResponse {
    /// A JSON response with the given status.
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        let mut headers = Headers::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        MockResponse::Success(Response::with_headers(
            status,
            headers,
            Bytes::from(body.to_string()),
        ))
    }
}

/// Mock HTTP client for testing.
///
/// URLs are matched exactly first, then by prefix, then the default
/// response is used.
///
/// # Example
///
/// ```ignore
/// use spark_cloud::adapters::mock::{MockHttpClient, MockResponse};
/// use spark_cloud::traits::{Headers, HttpClient};
///
/// let client = MockHttpClient::new();
/// client.set_response(
///     "https://api.particle.io/v1/devices",
///     MockResponse::json(200, serde_json::json!([])),
/// );
///
/// let response = client.get("https://api.particle.io/v1/devices", &Headers::new()).await?;
/// assert_eq!(response.status, 200);
/// assert_eq!(client.get_requests().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    default_response: Arc<Mutex<Option<MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response for a URL (exact or prefix match).
    pub fn set_response(&self, url: &str, response: MockResponse) {
        lock(&self.responses).insert(url.to_string(), response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.requests).last().cloned()
    }

    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    fn record_request(&self, method: Method, url: &str, headers: &Headers, body: Option<&str>) {
        lock(&self.requests).push(RecordedRequest {
            method,
            url: url.to_string(),
            headers: headers.clone(),
            body: body.map(str::to_string),
        });
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        let responses = lock(&self.responses);

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        // Longest matching prefix wins
        let prefix_match = responses
            .iter()
            .filter(|(pattern, _)| url.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, response)| response.clone());
        if prefix_match.is_some() {
            return prefix_match;
        }

        lock(&self.default_response).clone()
    }

    fn stream_response(
        content_type: &str,
        chunks: Vec<Bytes>,
        error: Option<HttpError>,
    ) -> StreamingResponse {
        let mut headers = Headers::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        let items = chunks
            .into_iter()
            .map(Ok)
            .chain(error.into_iter().map(Err))
            .collect::<Vec<_>>();
        StreamingResponse::new(200, headers, Box::pin(futures::stream::iter(items)))
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn request(
        &self,
        method: Method,
        url: &str,
        headers: &Headers,
        body: Option<&str>,
    ) -> Result<Response, HttpError> {
        self.record_request(method, url, headers, body);

        match self.get_response(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            Some(_) => Err(HttpError::Other(
                "Stream response on non-stream request".to_string(),
            )),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }

    async fn get_stream(
        &self,
        url: &str,
        headers: &Headers,
    ) -> Result<StreamingResponse, HttpError> {
        self.record_request(Method::Get, url, headers, None);

        match self.get_response(url) {
            Some(MockResponse::Stream(chunks)) => Ok(Self::stream_response(
                EVENT_STREAM_CONTENT_TYPE,
                chunks,
                None,
            )),
            Some(MockResponse::TypedStream {
                content_type,
                chunks,
            }) => Ok(Self::stream_response(&content_type, chunks, None)),
            Some(MockResponse::StreamError { chunks, error }) => Ok(Self::stream_response(
                EVENT_STREAM_CONTENT_TYPE,
                chunks,
                Some(error),
            )),
            Some(MockResponse::Success(response)) if !response.is_success() => {
                Err(HttpError::ServerError {
                    status: response.status,
                    message: response.text().unwrap_or_default(),
                })
            }
            Some(MockResponse::Success(_)) => Err(HttpError::Other(
                "Non-stream response on stream request".to_string(),
            )),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}
