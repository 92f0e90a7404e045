//! Policy-gated tool registry and outreach tools.
//!
//! Tools are the side-effecting capabilities the outreach pipeline may use:
//! sending messages, searching the web and reading the knowledge base or
//! memory. Every call goes through a [`ToolRegistry`], which checks that the
//! tool exists, that the [`ToolPolicy`] allows it, and that the identical
//! call has not been repeated too often ([`LoopDetector`]).
//!
//! # Built-in Tools
//!
//! ## Messaging
//! - [`Email`] - SMTP via `lettre`; dry run by default.
//! - [`WhatsApp`] - Dry run only.
//! - [`Telegram`] - Bot API `sendMessage`; dry run by default.
//!
//! ## Research
//! - [`WebSearch`] - First DuckDuckGo result link and snippet.
//! - [`OutreachKnowledge`] - Knowledge base context and search.
//! - [`OutreachMemory`] - Ranked memory patterns (read only).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agent_tools::default_registry;
//! use outreach_core::{MemoryStore, Settings};
//! use serde_json::json;
//!
//! # async fn run(store: Arc<dyn MemoryStore>) -> Result<(), Box<dyn std::error::Error>> {
//! let registry = default_registry(&Settings::default(), store)?;
//! let result = registry
//!     .run("email", json!({"to": "dr@example.com", "subject": "Hello", "body": "Hi"}))
//!     .await;
//! assert!(result.ok);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod loop_detection;
mod policy;
mod registry;
mod tool;
pub mod tools;

use std::sync::Arc;

use outreach_core::{MemoryStore, Settings};

pub use config::{SmtpConfig, TelegramConfig, DEFAULT_SMTP_PORT};
pub use error::ToolError;
pub use loop_detection::{
    hash_tool_call, LoopDetector, ToolCallRecord, MIN_CRITICAL_THRESHOLD, MIN_HISTORY_SIZE,
};
pub use policy::{normalize_tool_name, profile_tools, ToolPolicy, DEFAULT_PROFILE};
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolArgs, ToolResult};
pub use tools::{
    Email, OutreachKnowledge, OutreachMemory, ResultParser, SearchHit, Telegram, WebSearch,
    WhatsApp,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

/// Create a registry with every built-in tool, configured from settings.
///
/// SMTP and Telegram transports are read from the environment; when they
/// are absent the messaging tools still work in dry-run mode.
pub fn default_registry(
    settings: &Settings,
    memory: Arc<dyn MemoryStore>,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::from_settings(settings);

    // Messaging tools
    registry.register(Email::new(SmtpConfig::from_env()?)?);
    registry.register(WhatsApp::new());
    registry.register(Telegram::new(TelegramConfig::from_env())?);

    // Research tools
    registry.register(WebSearch::new()?);
    registry.register(OutreachKnowledge::new());
    registry.register(OutreachMemory::new(memory));

    Ok(registry)
}
