//! Cloud API client.
//!
//! Thin wrappers over the REST API plus the device event stream. Every
//! request is authenticated with the configured access token and goes
//! through the injected [`HttpClient`].

pub mod form;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use crate::adapters::ReqwestHttpClient;
use crate::config::ClientConfig;
use crate::error::{
    classify_http_error, http_status_error, ErrorContext, ResultExt, SparkResult, StreamError,
};
use crate::models::{Device, DeviceAttributes, FunctionResult, PublishResponse, VariableResult};
use crate::sse::{
    is_event_stream, EventRecord, EventStream, FragmentSource, ProcessorStats,
    StreamEventProcessor, EVENT_STREAM_CONTENT_TYPE,
};
use crate::traits::{Headers, HttpClient, Method};

use form::{path_segment, FORM_CONTENT_TYPE};

/// Which devices an event subscription covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventScope {
    /// Public events from every device.
    All,
    /// Events from devices owned by the token's account.
    Mine,
    /// Events from one device.
    Device(String),
}

/// Event subscription filter: a scope plus an optional event name prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub scope: EventScope,
    pub name: Option<String>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self {
            scope: EventScope::All,
            name: None,
        }
    }

    pub fn mine() -> Self {
        Self {
            scope: EventScope::Mine,
            name: None,
        }
    }

    pub fn device(id: impl Into<String>) -> Self {
        Self {
            scope: EventScope::Device(id.into()),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.is_empty() { None } else { Some(name) };
        self
    }

    /// API path for this filter.
    pub fn path(&self) -> String {
        let mut path = match &self.scope {
            EventScope::All => "/v1/events".to_string(),
            EventScope::Mine => "/v1/devices/events".to_string(),
            EventScope::Device(id) => format!("/v1/devices/{}/events", path_segment(id)),
        };
        if let Some(name) = &self.name {
            path.push('/');
            path.push_str(&path_segment(name));
        }
        path
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// Client for the Spark/Particle cloud.
#[derive(Clone)]
pub struct SparkClient {
    config: ClientConfig,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for SparkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparkClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SparkClient {
    /// Create a client that talks HTTP through reqwest.
    pub fn new(config: ClientConfig) -> SparkResult<Self> {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    /// Create a client over any [`HttpClient`].
    pub fn with_http_client(config: ClientConfig, http: Arc<dyn HttpClient>) -> SparkResult<Self> {
        config.validate()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A fresh processor with the configured limits.
    pub fn processor(&self) -> StreamEventProcessor {
        StreamEventProcessor::with_limits(self.config.buffer_limits)
    }

    fn auth_headers(&self) -> SparkResult<Headers> {
        let token = self.config.token()?;
        let mut headers = Headers::new();
        headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        Ok(headers)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        fields: &[(&str, &str)],
    ) -> SparkResult<T> {
        let url = self.config.url(path);
        let mut headers = self.auth_headers()?;
        let body = if fields.is_empty() {
            None
        } else {
            Some(form::encode(fields))
        };
        if body.is_some() {
            headers.insert("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string());
        }

        let response = self
            .http
            .request(method, &url, &headers, body.as_deref())
            .await
            .map_err(|e| classify_http_error(e, &url))?;

        if !response.is_success() {
            let text = String::from_utf8_lossy(&response.body);
            tracing::debug!("{} {} failed with HTTP {}", method, path, response.status);
            return Err(http_status_error(response.status, &text).into());
        }

        Ok(response.json::<T>()?)
    }

    fn device_path(id: &str) -> String {
        format!("/v1/devices/{}", path_segment(id))
    }

    /// `GET /v1/devices`
    pub async fn list_devices(&self) -> SparkResult<Vec<Device>> {
        self.send_json(Method::Get, "/v1/devices", &[])
            .await
            .context(ErrorContext::new("list_devices").with_component("cloud"))
    }

    /// `GET /v1/devices/{id}`
    pub async fn get_device(&self, id: &str) -> SparkResult<Device> {
        self.send_json(Method::Get, &Self::device_path(id), &[])
            .await
            .with_context(|| ErrorContext::new("get_device").with_device_id(id))
    }

    /// `GET /v1/devices/{id}`, keeping variables and functions.
    pub async fn get_attributes(&self, id: &str) -> SparkResult<DeviceAttributes> {
        self.send_json(Method::Get, &Self::device_path(id), &[])
            .await
            .with_context(|| ErrorContext::new("get_attributes").with_device_id(id))
    }

    /// `GET /v1/devices/{id}/{name}`
    pub async fn get_variable(&self, id: &str, name: &str) -> SparkResult<VariableResult> {
        let path = format!("{}/{}", Self::device_path(id), path_segment(name));
        self.send_json(Method::Get, &path, &[])
            .await
            .with_context(|| {
                ErrorContext::new("get_variable")
                    .with_device_id(id)
                    .with_name(name)
            })
    }

    /// `POST /v1/devices/{id}/{name}` with `args=`
    pub async fn call_function(
        &self,
        id: &str,
        name: &str,
        argument: &str,
    ) -> SparkResult<FunctionResult> {
        let path = format!("{}/{}", Self::device_path(id), path_segment(name));
        self.send_json(Method::Post, &path, &[("args", argument)])
            .await
            .with_context(|| {
                ErrorContext::new("call_function")
                    .with_device_id(id)
                    .with_name(name)
            })
    }

    /// `POST /v1/devices` with `id=`
    pub async fn claim_device(&self, id: &str) -> SparkResult<serde_json::Value> {
        self.send_json(Method::Post, "/v1/devices", &[("id", id)])
            .await
            .with_context(|| ErrorContext::new("claim_device").with_device_id(id))
    }

    /// `DELETE /v1/devices/{id}`
    pub async fn remove_device(&self, id: &str) -> SparkResult<serde_json::Value> {
        self.send_json(Method::Delete, &Self::device_path(id), &[])
            .await
            .with_context(|| ErrorContext::new("remove_device").with_device_id(id))
    }

    /// `PUT /v1/devices/{id}` with `name=`
    pub async fn rename_device(&self, id: &str, name: &str) -> SparkResult<serde_json::Value> {
        self.send_json(Method::Put, &Self::device_path(id), &[("name", name)])
            .await
            .with_context(|| {
                ErrorContext::new("rename_device")
                    .with_device_id(id)
                    .with_name(name)
            })
    }

    /// Start or stop the device's rainbow LED signal.
    pub async fn signal_device(&self, id: &str, on: bool) -> SparkResult<serde_json::Value> {
        let signal = if on { "1" } else { "0" };
        self.send_json(
            Method::Put,
            &Self::device_path(id),
            &[("signal", signal)],
        )
        .await
        .with_context(|| ErrorContext::new("signal_device").with_device_id(id))
    }

    /// Flash the stock Tinker firmware.
    pub async fn flash_tinker(&self, id: &str) -> SparkResult<serde_json::Value> {
        self.send_json(
            Method::Put,
            &Self::device_path(id),
            &[("app", "tinker")],
        )
        .await
        .with_context(|| ErrorContext::new("flash_tinker").with_device_id(id))
    }

    /// `POST /v1/devices/events`
    pub async fn publish_event(
        &self,
        name: &str,
        data: Option<&str>,
        private: bool,
    ) -> SparkResult<PublishResponse> {
        let private = if private { "true" } else { "false" };
        let mut fields = vec![("name", name)];
        if let Some(data) = data {
            fields.push(("data", data));
        }
        fields.push(("private", private));

        let response: PublishResponse = self
            .send_json(Method::Post, "/v1/devices/events", &fields)
            .await
            .with_context(|| ErrorContext::new("publish_event").with_name(name))?;
        tracing::debug!("Published event {} (ok={})", name, response.ok);
        Ok(response)
    }

    /// Open an event subscription.
    ///
    /// A response that is not `text/event-stream` is logged and yields an
    /// empty stream, or fails with `UnsupportedSource` when
    /// `strict_sources` is set.
    pub async fn get_event_stream(&self, filter: &EventFilter) -> SparkResult<EventStream> {
        let path = filter.path();
        let url = self.config.url(&path);
        let mut headers = self.auth_headers()?;
        headers.insert("Accept".to_string(), EVENT_STREAM_CONTENT_TYPE.to_string());

        let ctx = || {
            let ctx = ErrorContext::new("get_event_stream").with_component("sse");
            let ctx = match &filter.scope {
                EventScope::Device(id) => ctx.with_device_id(id.as_str()),
                _ => ctx,
            };
            match &filter.name {
                Some(name) => ctx.with_name(name.as_str()),
                None => ctx,
            }
        };

        let response = self
            .http
            .get_stream(&url, &headers)
            .await
            .map_err(|e| classify_http_error(e, &url))
            .with_context(ctx)?;

        if !is_event_stream(response.content_type()) {
            let reason = format!(
                "{} answered with content type {}",
                path,
                response.content_type().unwrap_or_default()
            );
            if self.config.strict_sources {
                return Err(StreamError::UnsupportedSource { reason }).with_context(ctx);
            }
            tracing::error!("Unsupported event source, not subscribing: {}", reason);
            return Ok(EventStream::empty());
        }

        tracing::info!("Subscribed to {}", path);
        Ok(EventStream::new(
            FragmentSource::EventEmitter(response.body),
            self.processor(),
        ))
    }

    /// Subscribe to public events (optionally filtered by name) and hand
    /// each record to `observer` on a background task.
    pub async fn on_event<F>(
        &self,
        name: Option<&str>,
        observer: F,
    ) -> SparkResult<JoinHandle<ProcessorStats>>
    where
        F: FnMut(EventRecord) + Send + 'static,
    {
        let mut filter = EventFilter::all();
        if let Some(name) = name {
            filter = filter.with_name(name);
        }
        let events = self.get_event_stream(&filter).await?;
        Ok(events.watch(observer))
    }
}
