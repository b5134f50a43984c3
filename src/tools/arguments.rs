//! Typed access to tool call arguments.

use crate::error::ToolError;

/// Argument mapping handed to a tool: string keys to JSON values.
///
/// Oracles sometimes send arguments as a JSON-encoded string, an empty
/// string, or `null`. [`ToolArguments::from_value`] normalises all of those
/// into an object and rejects anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: serde_json::Map<String, serde_json::Value>,
}

impl ToolArguments {
    pub fn new(value: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { value }
    }

    pub fn empty() -> Self {
        Self::new(serde_json::Map::new())
    }

    /// Normalise a raw payload from the oracle.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ToolError> {
        match value {
            serde_json::Value::Object(map) => Ok(Self::new(map.clone())),
            serde_json::Value::Null => Ok(Self::empty()),
            serde_json::Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(Self::empty());
                }
                let parsed: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
                    ToolError::InvalidArguments(format!("arguments are not valid JSON: {e}"))
                })?;
                match parsed {
                    serde_json::Value::Object(map) => Ok(Self::new(map)),
                    other => Err(ToolError::InvalidArguments(format!(
                        "expected a JSON object, got {}",
                        json_type_name(&other)
                    ))),
                }
            }
            other => Err(ToolError::InvalidArguments(format!(
                "expected a JSON object, got {}",
                json_type_name(other)
            ))),
        }
    }

    /// Get the raw JSON map.
    pub fn raw(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, ToolError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments(format!("missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, ToolError> {
        self.value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| ToolError::InvalidArguments(format!("missing integer argument: {key}")))
    }

    pub fn get_u64_opt(&self, key: &str) -> Option<u64> {
        self.value.get(key).and_then(|v| v.as_u64())
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ToolError> {
        self.value
            .get(key)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| ToolError::InvalidArguments(format!("missing boolean argument: {key}")))
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, ToolError> {
        serde_json::from_value(serde_json::Value::Object(self.value.clone()))
            .map_err(|e| ToolError::InvalidArguments(format!("failed to deserialize arguments: {e}")))
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
