//! Error types for tool operations.

use thiserror::Error;

/// Errors that can occur during tool execution.
///
/// The registry turns any of these into a failed [`crate::ToolResult`];
/// callers of [`crate::ToolRegistry::run`] never see them directly.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Missing required parameter.
    #[error("Missing {0}")]
    MissingParameter(String),

    /// Invalid parameter value.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Tool is not configured for live use.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// General execution error.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}
