//! Router fallback behaviour against a scripted executor.

use std::collections::VecDeque;
use std::sync::Arc;

use llm_router::{
    async_trait, AgentLlmConfig, JsonObject, JsonTaskExecutor, LlmError, LlmRouter,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;

/// Replays queued outcomes and records which models were asked.
#[derive(Default)]
struct ScriptedExecutor {
    outcomes: Mutex<VecDeque<Result<Value, String>>>,
    calls: Mutex<Vec<(String, String, f32)>>,
}

impl ScriptedExecutor {
    fn new(outcomes: Vec<Result<Value, String>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    async fn models_called(&self) -> Vec<String> {
        self.calls.lock().await.iter().map(|c| c.0.clone()).collect()
    }
}

#[async_trait]
impl JsonTaskExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        _system_prompt: &str,
        payload: &str,
        model: &str,
        temperature: f32,
    ) -> Result<JsonObject, LlmError> {
        self.calls
            .lock()
            .await
            .push((model.to_string(), payload.to_string(), temperature));

        match self.outcomes.lock().await.pop_front() {
            Some(Ok(Value::Object(object))) => Ok(object),
            Some(Ok(_)) => Err(LlmError::InvalidResponse("not an object".to_string())),
            Some(Err(message)) => Err(LlmError::Network(message)),
            None => Err(LlmError::Network("no scripted outcome".to_string())),
        }
    }
}

fn config(models: &[&str]) -> AgentLlmConfig {
    AgentLlmConfig::builder()
        .api_key("test-key")
        .models(models.iter().copied())
        .build()
}

#[tokio::test]
async fn test_first_model_success() {
    let executor = ScriptedExecutor::new(vec![Ok(json!({"query": "cardiology Algiers"}))]);
    let router = LlmRouter::with_executor(config(&["m1", "m2"]), executor.clone()).unwrap();

    let result = router
        .run_json_task("system", &json!({"lead": {"city": "Algiers"}}), 0.1)
        .await
        .unwrap();

    assert_eq!(result["query"], "cardiology Algiers");
    assert_eq!(executor.models_called().await, vec!["m1"]);
    let calls = executor.calls.lock().await;
    assert_eq!(calls[0].1, r#"{"lead":{"city":"Algiers"}}"#);
    assert_eq!(calls[0].2, 0.1);
}

#[tokio::test]
async fn test_falls_through_to_next_model() {
    let executor = ScriptedExecutor::new(vec![
        Err("timeout".to_string()),
        Ok(json!(["not", "an", "object"])),
        Ok(json!({"score": 0.8})),
    ]);
    let router = LlmRouter::with_executor(config(&["a", "b", "c"]), executor.clone()).unwrap();

    let result = router.run_json_task("system", &json!({}), 0.2).await.unwrap();

    assert_eq!(result["score"], 0.8);
    assert_eq!(executor.models_called().await, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_all_models_fail_returns_none() {
    let executor = ScriptedExecutor::new(vec![Err("500".to_string()), Err("502".to_string())]);
    let router = LlmRouter::with_executor(config(&["a", "b"]), executor.clone()).unwrap();

    assert!(router.run_json_task("system", &json!({}), 0.2).await.is_none());
    assert_eq!(executor.models_called().await.len(), 2);
}

#[tokio::test]
async fn test_empty_model_list_makes_no_call() {
    let executor = ScriptedExecutor::new(vec![Ok(json!({"ok": true}))]);
    let router = LlmRouter::with_executor(config(&[]), executor.clone()).unwrap();

    assert!(router.run_json_task("system", &json!({}), 0.2).await.is_none());
    assert!(executor.models_called().await.is_empty());
}

#[tokio::test]
async fn test_missing_api_key_makes_no_call() {
    let executor = ScriptedExecutor::new(vec![Ok(json!({"ok": true}))]);
    let config = AgentLlmConfig::builder().provider("anthropic").build();
    let router = LlmRouter::with_executor(config, executor.clone()).unwrap();

    assert!(!router.available());
    assert!(router.run_json_task("system", &json!({}), 0.2).await.is_none());
    assert!(executor.models_called().await.is_empty());
}

#[tokio::test]
async fn test_self_hosted_runs_without_key() {
    let executor = ScriptedExecutor::new(vec![Ok(json!({"ok": true}))]);
    let config = AgentLlmConfig::builder()
        .provider("vllm")
        .models(["local"])
        .build();
    let router = LlmRouter::with_executor(config, executor.clone()).unwrap();

    assert!(router.run_json_task("system", &json!({}), 0.2).await.is_some());
    assert_eq!(executor.models_called().await, vec!["local"]);
}

#[tokio::test]
async fn test_connection_reports_answering_model() {
    let executor = ScriptedExecutor::new(vec![Err("refused".to_string()), Ok(json!({"pong": "ok"}))]);
    let router = LlmRouter::with_executor(config(&["a", "b"]), executor).unwrap();

    let report = router.test_connection().await;
    assert!(report.ok);
    assert_eq!(report.provider, "openai");
    assert_eq!(report.model, "b");
    assert_eq!(report.base_url, "https://api.openai.com/v1");
    assert!(report.error.is_none());
}

#[tokio::test]
async fn test_connection_reports_failure() {
    let executor = ScriptedExecutor::new(vec![Err("refused".to_string())]);
    let router = LlmRouter::with_executor(config(&["only"]), executor).unwrap();

    let report = router.test_connection().await;
    assert!(!report.ok);
    assert_eq!(report.model, "only");
    assert!(report.error.unwrap().contains("refused"));

    let router = LlmRouter::with_executor(
        AgentLlmConfig::builder().provider("gemini").build(),
        ScriptedExecutor::new(vec![]),
    )
    .unwrap();
    let report = router.test_connection().await;
    assert!(!report.ok);
    assert!(report.error.unwrap().contains("API key"));
}
