//! Tool data types.
//!
//! Tools are named side-effect operations invocable independent of any
//! backend. The catalog is static: descriptors are read-only at runtime.

use serde::{Deserialize, Serialize};

/// One declared parameter of a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub required: bool,
}

impl ToolParameter {
    pub fn string(name: &str, description: &str, required: bool) -> Self {
        Self {
            name: name.into(),
            kind: "string".into(),
            description: description.into(),
            required,
        }
    }
}

/// A catalog entry describing one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

/// The outcome of one tool execution. Failures are structured results, not
/// errors — callers inspect `success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecutionResult {
    pub name: String,
    pub input: serde_json::Map<String, serde_json::Value>,
    pub output: serde_json::Value,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolExecutionResult {
    pub fn ok(
        name: impl Into<String>,
        input: serde_json::Map<String, serde_json::Value>,
        output: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            input,
            output,
            success: true,
            error: None,
        }
    }

    pub fn failed(
        name: impl Into<String>,
        input: serde_json::Map<String, serde_json::Value>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input,
            output: serde_json::Value::Null,
            success: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_serializes_type_field() {
        let param = ToolParameter::string("query", "Search query", true);
        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(json["type"], "string");
        assert_eq!(json["required"], true);
    }

    #[test]
    fn failed_result_carries_error_and_null_output() {
        let result =
            ToolExecutionResult::failed("nope", serde_json::Map::new(), "Tool 'nope' not found");
        assert!(!result.success);
        assert!(result.output.is_null());
        assert_eq!(result.error.as_deref(), Some("Tool 'nope' not found"));
    }

    #[test]
    fn ok_result_has_no_error() {
        let result = ToolExecutionResult::ok("time", serde_json::Map::new(), "12:00".into());
        assert!(result.success);
        assert!(result.error.is_none());
    }
}
