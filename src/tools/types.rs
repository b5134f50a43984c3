//! Tool descriptors and JSON Schema parameter builders.

use serde::{Deserialize, Serialize};

/// Name, description and parameter schema advertised to the oracle.
///
/// Fixed when the tool is registered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// JSON Schema-based parameter definition for a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ToolParameters {
    /// JSON Schema object describing the parameters.
    pub schema: serde_json::Value,
}

impl ToolParameters {
    /// Create from a raw JSON Schema value.
    pub fn from_schema(schema: serde_json::Value) -> Self {
        Self { schema }
    }

    /// Create an empty parameter schema (no parameters).
    pub fn empty() -> Self {
        Self {
            schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": [],
            }),
        }
    }

    /// Builder: create an object schema with properties.
    pub fn object() -> ParameterBuilder {
        ParameterBuilder {
            properties: serde_json::Map::new(),
            required: Vec::new(),
        }
    }
}

/// Builder for constructing tool parameter schemas.
pub struct ParameterBuilder {
    properties: serde_json::Map<String, serde_json::Value>,
    required: Vec<String>,
}

impl ParameterBuilder {
    fn property(
        mut self,
        name: impl Into<String>,
        mut schema: serde_json::Value,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();
        schema["description"] = serde_json::Value::String(description.into());
        self.properties.insert(name.clone(), schema);
        if required {
            self.required.push(name);
        }
        self
    }

    pub fn string(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.property(name, serde_json::json!({"type": "string"}), description, required)
    }

    pub fn integer(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.property(name, serde_json::json!({"type": "integer"}), description, required)
    }

    pub fn number(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.property(name, serde_json::json!({"type": "number"}), description, required)
    }

    pub fn boolean(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.property(name, serde_json::json!({"type": "boolean"}), description, required)
    }

    /// Add an enum (string) property.
    pub fn string_enum(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        values: &[&str],
        required: bool,
    ) -> Self {
        self.property(
            name,
            serde_json::json!({"type": "string", "enum": values}),
            description,
            required,
        )
    }

    pub fn build(self) -> ToolParameters {
        ToolParameters {
            schema: serde_json::json!({
                "type": "object",
                "properties": self.properties,
                "required": self.required,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_builder_constructs_schema() {
        let params = ToolParameters::object()
            .string("query", "Search query", true)
            .integer("limit", "Max results", false)
            .boolean("verbose", "Verbose output", false)
            .build();

        let schema = &params.schema;
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["query"]["type"], "string");
        assert_eq!(schema["properties"]["query"]["description"], "Search query");
        assert_eq!(schema["properties"]["limit"]["type"], "integer");
        assert_eq!(schema["required"], serde_json::json!(["query"]));
    }

    #[test]
    fn string_enum_lists_values() {
        let params = ToolParameters::object()
            .string_enum("region", "Search region", &["us", "uk", "de"], false)
            .build();
        let values = params.schema["properties"]["region"]["enum"].as_array().unwrap();
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn descriptor_serializes_schema_inline() {
        let descriptor = ToolDescriptor::new("noop", "Does nothing", ToolParameters::empty());
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["parameters"]["type"], "object");
    }
}
