//! Error types for the LLM router.

use thiserror::Error;

/// Errors raised while configuring the router or executing a model attempt.
///
/// Only [`LlmError::UnsupportedProvider`] and [`LlmError::Configuration`]
/// escape the router; everything else fails a single model attempt and is
/// absorbed by [`crate::LlmRouter::run_json_task`].
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider id has no wire adapter.
    #[error("unsupported LLM provider: {0}")]
    UnsupportedProvider(String),

    /// Router could not be constructed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Provider requires a key and none was resolved.
    #[error("API key not configured for provider {0}")]
    MissingApiKey(String),

    /// Transport failure, including timeouts.
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response from the provider.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response had no usable JSON object.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}
