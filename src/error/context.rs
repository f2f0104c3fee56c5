//! Error context for enriched error information.

use chrono::{DateTime, Utc};

/// Where and when an error occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext {
    /// The client operation that failed, e.g. `get_variable`.
    pub operation: String,

    /// Device the operation targeted.
    pub device_id: Option<String>,

    /// Variable, function, or event name involved.
    pub name: Option<String>,

    pub timestamp: DateTime<Utc>,

    /// Module where the error originated.
    pub component: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            device_id: None,
            name: None,
            timestamp: Utc::now(),
            component: None,
        }
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Formatted context string suitable for logging.
    pub fn to_log_string(&self) -> String {
        let mut parts = vec![format!("operation={}", self.operation)];

        if let Some(ref device_id) = self.device_id {
            parts.push(format!("device_id={}", device_id));
        }
        if let Some(ref name) = self.name {
            parts.push(format!("name={}", name));
        }
        if let Some(ref component) = self.component {
            parts.push(format!("component={}", component));
        }
        parts.push(format!("timestamp={}", self.timestamp.to_rfc3339()));

        parts.join(" ")
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.operation)?;

        if let Some(ref device_id) = self.device_id {
            write!(f, " device={}", device_id)?;
        }
        if let Some(ref name) = self.name {
            write!(f, " name={}", name)?;
        }

        Ok(())
    }
}
