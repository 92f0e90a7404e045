//! Pipeline stages.
//!
//! Each stage takes what earlier stages produced and returns its own
//! addition. A stage never fails because a model is unavailable: it falls
//! back to a deterministic heuristic and says so in its output.

pub mod copywriter;
pub mod lead_intelligence;
pub mod reflection;
pub mod research;
pub mod rewrite;
pub mod routing;
pub mod supervisor;

use llm_router::JsonObject;
use serde_json::Value;

/// A non-blank string field of a model response.
pub(crate) fn text_field(object: &JsonObject, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A numeric field of a model response; numeric strings are accepted.
pub(crate) fn number_field(object: &JsonObject, key: &str) -> Option<f64> {
    match object.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use llm_router::{
        async_trait, AgentLlmConfig, JsonObject, JsonTaskExecutor, LlmError, LlmRouter,
    };
    use serde_json::Value;
    use tokio::sync::Mutex;

    /// Answers with the first response whose marker appears in the system
    /// prompt; fails otherwise. Records every payload it receives.
    #[derive(Default)]
    pub struct PromptExecutor {
        responses: Vec<(&'static str, Value)>,
        pub payloads: Mutex<Vec<(String, f32)>>,
    }

    impl PromptExecutor {
        pub fn new(responses: Vec<(&'static str, Value)>) -> Arc<Self> {
            Arc::new(Self {
                responses,
                payloads: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl JsonTaskExecutor for PromptExecutor {
        async fn execute(
            &self,
            system_prompt: &str,
            payload: &str,
            _model: &str,
            temperature: f32,
        ) -> Result<JsonObject, LlmError> {
            self.payloads
                .lock()
                .await
                .push((payload.to_string(), temperature));

            self.responses
                .iter()
                .find(|(marker, _)| system_prompt.contains(marker))
                .and_then(|(_, value)| value.as_object().cloned())
                .ok_or_else(|| LlmError::Network("no scripted response".to_string()))
        }
    }

    /// Router over a self-hosted provider so no API key is needed.
    pub fn router(executor: Arc<PromptExecutor>, rewrite: bool, research: bool) -> Arc<LlmRouter> {
        let config = AgentLlmConfig::builder()
            .provider("ollama")
            .models(["test-model"])
            .enable_llm_rewrite(rewrite)
            .enable_web_research(research)
            .build();
        Arc::new(LlmRouter::with_executor(config, executor).unwrap())
    }

    /// Router that can never reach a model.
    pub fn offline_router() -> Arc<LlmRouter> {
        router(PromptExecutor::new(Vec::new()), false, false)
    }
}
