//! Multi-provider LLM router for the outreach agents.
//!
//! Every agent stage talks to a model through one contract: send a system
//! prompt plus a JSON payload, get a JSON object back or `None`.
//!
//! - [`resolve_agent_llm_config`] merges owner overrides, provider presets
//!   and global settings into an [`AgentLlmConfig`]
//! - [`Provider`] adapts the task to OpenAI-compatible, Anthropic or Gemini
//!   wire protocols
//! - [`LlmRouter`] tries each configured model in order
//!
//! ```rust,no_run
//! use llm_router::{resolve_agent_llm_config, LlmRouter};
//! use outreach_core::Settings;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::from_env()?;
//! let router = LlmRouter::new(resolve_agent_llm_config(None, &settings))?;
//! if let Some(object) = router
//!     .run_json_task("Return strict JSON.", &json!({"output_schema": {"query": "string"}}), 0.1)
//!     .await
//! {
//!     println!("{:?}", object.get("query"));
//! }
//! # Ok(())
//! # }
//! ```

mod api_types;
mod config;
mod error;
mod provider;
mod router;

pub use config::{
    find_preset, list_provider_options, resolve_agent_llm_config, AgentLlmConfig,
    AgentLlmConfigBuilder, ProviderFamily, ProviderOption, ProviderPreset, DEFAULT_PROMPT_REWRITE,
    DEFAULT_PROMPT_ROUTING, DEFAULT_PROMPT_SEARCH, DEFAULT_PROMPT_SUPERVISOR, DEFAULT_PROVIDER,
    PROVIDER_PRESETS,
};
pub use error::LlmError;
pub use provider::{parse_json_object, JsonObject, JsonTaskExecutor, Provider};
pub use router::{ConnectionReport, LlmRouter, GENERATION_TIMEOUT, PROBE_TIMEOUT};

// Re-export async_trait for custom executors
pub use async_trait::async_trait;
