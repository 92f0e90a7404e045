//! The LLM router: ordered model fallback over one provider adapter.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{find_preset, AgentLlmConfig};
use crate::error::LlmError;
use crate::provider::{JsonObject, JsonTaskExecutor, Provider};

/// Timeout for generation requests.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the connectivity probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(20);

const PROBE_SYSTEM_PROMPT: &str = "You are a connectivity check. Return strict JSON.";

/// Outcome of [`LlmRouter::test_connection`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionReport {
    pub ok: bool,
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub error: Option<String>,
}

/// Executes JSON tasks against the configured models in order.
///
/// A `None` from [`run_json_task`](Self::run_json_task) means no model
/// produced a usable JSON object; callers fall back to their heuristics.
pub struct LlmRouter {
    config: AgentLlmConfig,
    executor: Arc<dyn JsonTaskExecutor>,
    probe: Arc<dyn JsonTaskExecutor>,
    requires_api_key: bool,
}

impl LlmRouter {
    /// Create a router with the provider adapter for `config.provider`.
    ///
    /// An unknown provider id is a configuration defect and is returned as
    /// [`LlmError::UnsupportedProvider`].
    pub fn new(config: AgentLlmConfig) -> Result<Self, LlmError> {
        let client = build_client(GENERATION_TIMEOUT)?;
        let probe_client = build_client(PROBE_TIMEOUT)?;

        let executor = Provider::from_config(&config, client)?;
        let probe = Provider::from_config(&config, probe_client)?;

        Self::assemble(config, Arc::new(executor), Arc::new(probe))
    }

    /// Create a router around a custom executor.
    pub fn with_executor(
        config: AgentLlmConfig,
        executor: Arc<dyn JsonTaskExecutor>,
    ) -> Result<Self, LlmError> {
        Self::assemble(config, executor.clone(), executor)
    }

    fn assemble(
        config: AgentLlmConfig,
        executor: Arc<dyn JsonTaskExecutor>,
        probe: Arc<dyn JsonTaskExecutor>,
    ) -> Result<Self, LlmError> {
        let preset = find_preset(&config.provider)
            .ok_or_else(|| LlmError::UnsupportedProvider(config.provider.clone()))?;

        info!(
            "LlmRouter initialized with provider: {}, models: {:?}, api_key: {}",
            config.provider,
            config.models,
            if config.has_api_key() { "set" } else { "unset" }
        );

        Ok(Self {
            requires_api_key: preset.requires_api_key,
            config,
            executor,
            probe,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &AgentLlmConfig {
        &self.config
    }

    /// Whether a call could reach a model at all.
    pub fn available(&self) -> bool {
        !self.config.models.is_empty() && (!self.requires_api_key || self.config.has_api_key())
    }

    /// Run a JSON task, trying each configured model in order.
    ///
    /// `payload` is serialized as the single user message. Returns the first
    /// JSON object any model produces, or `None` once every model has failed.
    /// With no models, or a missing required API key, returns `None` without
    /// any network call.
    pub async fn run_json_task(
        &self,
        system_prompt: &str,
        payload: &Value,
        temperature: f32,
    ) -> Option<JsonObject> {
        if !self.available() {
            debug!(
                "LLM unavailable for provider {} (models: {}, api_key: {})",
                self.config.provider,
                self.config.models.len(),
                self.config.has_api_key()
            );
            return None;
        }

        let user_payload = payload.to_string();

        for model in &self.config.models {
            match self
                .executor
                .execute(system_prompt, &user_payload, model, temperature)
                .await
            {
                Ok(object) => {
                    debug!("Model {} returned {} keys", model, object.len());
                    return Some(object);
                }
                Err(e) => {
                    warn!("Model {} failed on {}: {}", model, self.config.provider, e);
                }
            }
        }

        None
    }

    /// Send a trivial JSON ping and report which endpoint answered.
    ///
    /// Models are tried in order; the report names the first model that
    /// answered, or the last one tried when all fail.
    pub async fn test_connection(&self) -> ConnectionReport {
        let mut report = ConnectionReport {
            ok: false,
            provider: self.config.provider.clone(),
            model: self.config.models.first().cloned().unwrap_or_default(),
            base_url: self.config.base_url.clone(),
            error: None,
        };

        if self.config.models.is_empty() {
            report.error = Some("No models configured".to_string());
            return report;
        }
        if self.requires_api_key && !self.config.has_api_key() {
            report.error = Some(LlmError::MissingApiKey(self.config.provider.clone()).to_string());
            return report;
        }

        let payload = json!({
            "ping": "ok",
            "output_schema": { "pong": "ok" },
        })
        .to_string();

        for model in &self.config.models {
            report.model = model.clone();
            match self
                .probe
                .execute(PROBE_SYSTEM_PROMPT, &payload, model, 0.0)
                .await
            {
                Ok(_) => {
                    info!("Connection test ok: {} / {}", self.config.provider, model);
                    report.ok = true;
                    report.error = None;
                    return report;
                }
                Err(e) => {
                    warn!("Connection test failed: {} / {}: {}", self.config.provider, model, e);
                    report.error = Some(e.to_string());
                }
            }
        }

        report
    }
}

fn build_client(timeout: Duration) -> Result<Client, LlmError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))
}
