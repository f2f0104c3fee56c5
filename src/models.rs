//! REST API response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A device as listed by the cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub last_heard: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_ip_address: Option<String>,
    #[serde(default)]
    pub last_app: Option<String>,
    #[serde(default)]
    pub product_id: Option<u32>,
    #[serde(default)]
    pub platform_id: Option<u32>,
}

impl Device {
    /// Name for display, falling back to the id.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }
}

/// A device plus its exposed variables and functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceAttributes {
    #[serde(flatten)]
    pub device: Device,
    /// Variable name to type name (`int32`, `double`, `string`)
    #[serde(default)]
    pub variables: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub functions: Option<Vec<String>>,
}

impl DeviceAttributes {
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables
            .as_ref()
            .map(|vars| vars.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions
            .as_ref()
            .map(|funcs| funcs.iter().any(|f| f == name))
            .unwrap_or(false)
    }
}

/// Reply to a variable read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableResult {
    pub name: String,
    pub result: serde_json::Value,
    #[serde(rename = "coreInfo", default, skip_serializing_if = "Option::is_none")]
    pub core_info: Option<serde_json::Value>,
}

/// Reply to a function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResult {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub connected: bool,
    pub return_value: i64,
}

/// Reply to an event publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResponse {
    pub ok: bool,
}
