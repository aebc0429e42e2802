//! Typed access to tool call arguments.

use crate::error::ThreadrunError;

/// Parsed arguments of one tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Parse the raw JSON argument string sent by the service.
    ///
    /// An empty or whitespace-only string is treated as `{}`.
    pub fn parse(raw: &str) -> Result<Self, ThreadrunError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::new(serde_json::json!({})));
        }
        serde_json::from_str(trimmed)
            .map(Self::new)
            .map_err(|e| ThreadrunError::InvalidArgument(format!("Malformed tool arguments: {e}")))
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, ThreadrunError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ThreadrunError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, ThreadrunError> {
        self.value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| ThreadrunError::InvalidArgument(format!("Missing integer argument: {key}")))
    }

    pub fn get_f64(&self, key: &str) -> Result<f64, ThreadrunError> {
        self.value
            .get(key)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ThreadrunError::InvalidArgument(format!("Missing float argument: {key}")))
    }

    /// Deserialize the whole argument object into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, ThreadrunError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            ThreadrunError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
