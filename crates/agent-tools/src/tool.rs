//! Tool trait definition and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ToolError;

/// Arguments passed to a tool for execution.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    /// Parameters as key-value pairs.
    pub params: Map<String, Value>,
}

impl ToolArgs {
    /// Create new tool arguments with the given parameters.
    pub fn new(params: Map<String, Value>) -> Self {
        Self { params }
    }

    /// Build arguments from a JSON payload. Non-object payloads are empty.
    pub fn from_value(payload: Value) -> Self {
        match payload {
            Value::Object(params) => Self { params },
            _ => Self::default(),
        }
    }

    /// Get a trimmed, non-empty string parameter.
    pub fn get_string(&self, key: &str) -> Result<String, ToolError> {
        self.get_string_opt(key)
            .ok_or_else(|| ToolError::MissingParameter(key.to_string()))
    }

    /// Get an optional string parameter.
    ///
    /// Numbers are rendered as strings; blank strings count as absent.
    pub fn get_string_opt(&self, key: &str) -> Option<String> {
        let value = match self.params.get(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!value.is_empty()).then_some(value)
    }

    /// Get an optional boolean parameter with a default value.
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.params
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    /// Get an integer parameter with a default value.
    ///
    /// Accepts JSON numbers and numeric strings; zero counts as absent.
    pub fn get_i64_or(&self, key: &str, default: i64) -> i64 {
        let value = match self.params.get(key) {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        value.filter(|v| *v != 0).unwrap_or(default)
    }
}

/// Uniform outcome of a tool invocation.
///
/// Returned for successes, tool failures and registry blocks alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub ok: bool,
    pub tool: String,
    pub data: Value,
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful result.
    pub fn success(tool: impl Into<String>, data: Value) -> Self {
        Self {
            ok: true,
            tool: tool.into(),
            data,
            error: None,
        }
    }

    /// Create a failed result.
    pub fn failure(tool: impl Into<String>, data: Value, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            tool: tool.into(),
            data,
            error: Some(error.into()),
        }
    }

    /// Create a result for a call the registry refused to dispatch.
    pub fn blocked(tool: impl Into<String>, reason: &str, error: impl Into<String>) -> Self {
        Self::failure(tool, json!({"status": "blocked", "reason": reason}), error)
    }

    /// The block reason (`policy_denied`, `loop_detected`), if blocked.
    pub fn blocked_reason(&self) -> Option<&str> {
        if self.data.get("status").and_then(Value::as_str) != Some("blocked") {
            return None;
        }
        self.data.get("reason").and_then(Value::as_str)
    }
}

/// A named, side-effecting capability dispatched through the registry.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's unique name (used for dispatch).
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// Run the tool with the given arguments.
    async fn run(&self, args: ToolArgs) -> Result<ToolResult, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(payload: Value) -> ToolArgs {
        ToolArgs::from_value(payload)
    }

    #[test]
    fn test_get_string() {
        let args = args(json!({"to": "  a@b.com ", "blank": "  ", "chat_id": 42}));

        assert_eq!(args.get_string("to").unwrap(), "a@b.com");
        assert_eq!(args.get_string_opt("chat_id").as_deref(), Some("42"));
        assert!(args.get_string_opt("blank").is_none());
        assert!(matches!(
            args.get_string("missing"),
            Err(ToolError::MissingParameter(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_get_bool_and_i64() {
        let args = args(json!({"dry_run": false, "limit": "7", "zero": 0}));

        assert!(!args.get_bool_or("dry_run", true));
        assert!(args.get_bool_or("other", true));
        assert_eq!(args.get_i64_or("limit", 5), 7);
        assert_eq!(args.get_i64_or("zero", 5), 5);
        assert_eq!(args.get_i64_or("missing", 5), 5);
    }

    #[test]
    fn test_non_object_payload_is_empty() {
        assert!(ToolArgs::from_value(json!(["x"])).params.is_empty());
    }

    #[test]
    fn test_blocked_reason() {
        let blocked = ToolResult::blocked("email", "loop_detected", "blocked");
        assert!(!blocked.ok);
        assert_eq!(blocked.blocked_reason(), Some("loop_detected"));

        let failed = ToolResult::failure("email", json!({}), "boom");
        assert_eq!(failed.blocked_reason(), None);
    }
}
