//! Error types for core operations.

use thiserror::Error;

/// Errors raised while parsing core values or loading settings.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A campaign channel outside the supported set.
    #[error("unsupported channel: {0}")]
    InvalidChannel(String),

    /// An environment setting that could not be parsed.
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}
