//! Provider wire adapters.
//!
//! Each adapter turns one `(system prompt, JSON payload, model, temperature)`
//! task into a single HTTP request and returns the JSON object the model
//! produced. The provider family is chosen once in [`Provider::from_config`];
//! nothing downstream branches on the provider id.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{Map, Value};
use tracing::debug;

use crate::api_types::{
    ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, GeminiContent,
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, MessagesRequest,
    MessagesResponse, ResponseFormat,
};
use crate::config::{find_preset, AgentLlmConfig, ProviderFamily};
use crate::error::LlmError;

/// Appended to the Anthropic system prompt, which has no JSON mode.
const JSON_ONLY_INSTRUCTION: &str =
    "Respond with a single valid JSON object only. Do not add prose or Markdown.";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 1024;

/// A JSON object returned by a model.
pub type JsonObject = Map<String, Value>;

/// Executes one JSON task against one model.
#[async_trait]
pub trait JsonTaskExecutor: Send + Sync {
    /// Run the task. Any error fails this model attempt only.
    async fn execute(
        &self,
        system_prompt: &str,
        payload: &str,
        model: &str,
        temperature: f32,
    ) -> Result<JsonObject, LlmError>;
}

/// The wire adapter for a provider family.
pub enum Provider {
    OpenAiCompatible(OpenAiCompatible),
    Anthropic(Anthropic),
    Gemini(Gemini),
}

impl Provider {
    /// Select the adapter for the configured provider id.
    pub fn from_config(config: &AgentLlmConfig, client: Client) -> Result<Self, LlmError> {
        let preset = find_preset(&config.provider)
            .ok_or_else(|| LlmError::UnsupportedProvider(config.provider.clone()))?;
        let endpoint = Endpoint {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key().map(str::to_string),
        };

        Ok(match preset.family {
            ProviderFamily::OpenAiCompatible => Provider::OpenAiCompatible(OpenAiCompatible(endpoint)),
            ProviderFamily::Anthropic => Provider::Anthropic(Anthropic(endpoint)),
            ProviderFamily::Gemini => Provider::Gemini(Gemini(endpoint)),
        })
    }
}

#[async_trait]
impl JsonTaskExecutor for Provider {
    async fn execute(
        &self,
        system_prompt: &str,
        payload: &str,
        model: &str,
        temperature: f32,
    ) -> Result<JsonObject, LlmError> {
        match self {
            Provider::OpenAiCompatible(adapter) => {
                adapter.execute(system_prompt, payload, model, temperature).await
            }
            Provider::Anthropic(adapter) => {
                adapter.execute(system_prompt, payload, model, temperature).await
            }
            Provider::Gemini(adapter) => {
                adapter.execute(system_prompt, payload, model, temperature).await
            }
        }
    }
}

/// Shared HTTP state for an adapter.
pub struct Endpoint {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// OpenAI-compatible `/chat/completions`.
pub struct OpenAiCompatible(Endpoint);

/// Anthropic `/v1/messages`.
pub struct Anthropic(Endpoint);

/// Gemini `generateContent`.
pub struct Gemini(Endpoint);

#[async_trait]
impl JsonTaskExecutor for OpenAiCompatible {
    async fn execute(
        &self,
        system_prompt: &str,
        payload: &str,
        model: &str,
        temperature: f32,
    ) -> Result<JsonObject, LlmError> {
        let url = format!("{}/chat/completions", self.0.base_url);
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(payload)],
            temperature,
            response_format: ResponseFormat::json_object(),
        };

        debug!("Sending chat completion request to {} (model {})", url, model);

        let mut builder = self.0.client.post(&url).json(&request);
        if let Some(ref key) = self.0.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = check_status(builder.send().await?).await?;
        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        parse_json_object(&content)
    }
}

#[async_trait]
impl JsonTaskExecutor for Anthropic {
    async fn execute(
        &self,
        system_prompt: &str,
        payload: &str,
        model: &str,
        temperature: f32,
    ) -> Result<JsonObject, LlmError> {
        let url = format!("{}/v1/messages", self.0.base_url);
        let request = MessagesRequest {
            model: model.to_string(),
            system: format!("{}\n\n{}", system_prompt, JSON_ONLY_INSTRUCTION),
            max_tokens: ANTHROPIC_MAX_TOKENS,
            temperature,
            messages: vec![ChatMessage::user(payload)],
        };

        debug!("Sending messages request to {} (model {})", url, model);

        let response = self
            .0
            .client
            .post(&url)
            .header("x-api-key", self.0.api_key.as_deref().unwrap_or_default())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;
        let messages: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content: String = messages
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect();

        parse_json_object(&content)
    }
}

#[async_trait]
impl JsonTaskExecutor for Gemini {
    async fn execute(
        &self,
        system_prompt: &str,
        payload: &str,
        model: &str,
        temperature: f32,
    ) -> Result<JsonObject, LlmError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.0.base_url, model);
        let request = GenerateContentRequest {
            system_instruction: GeminiContent::text(None, system_prompt),
            contents: vec![GeminiContent::text(Some("user"), payload)],
            generation_config: GenerationConfig {
                temperature,
                response_mime_type: "application/json".to_string(),
            },
        };

        debug!("Sending generateContent request (model {})", model);

        let response = self
            .0
            .client
            .post(&url)
            .query(&[("key", self.0.api_key.as_deref().unwrap_or_default())])
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;
        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .unwrap_or_default();

        parse_json_object(&content)
    }
}

/// Map a non-2xx response to [`LlmError::Api`].
async fn check_status(response: Response) -> Result<Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&error_text)
        .map(|api_error| api_error.error.message)
        .unwrap_or(error_text);

    Err(LlmError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Parse model output as a JSON object.
///
/// Accepts the object bare or wrapped in a single Markdown code fence.
pub fn parse_json_object(content: &str) -> Result<JsonObject, LlmError> {
    let trimmed = strip_code_fence(content.trim());
    if trimmed.is_empty() {
        return Err(LlmError::InvalidResponse("empty content".to_string()));
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(LlmError::InvalidResponse(
            "content is not a JSON object".to_string(),
        )),
        Err(e) => Err(LlmError::InvalidResponse(format!("content is not JSON: {}", e))),
    }
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return content;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    match inner.find('\n') {
        Some(idx) => inner[idx + 1..].trim(),
        None => inner.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_object() {
        let object = parse_json_object(r#" {"query": "cardiology Algiers"} "#).unwrap();
        assert_eq!(object["query"], "cardiology Algiers");
    }

    #[test]
    fn test_parse_fenced_object() {
        let object = parse_json_object("```json\n{\"score\": 0.9}\n```").unwrap();
        assert_eq!(object["score"], 0.9);

        let object = parse_json_object("```\n{\"ok\": true}\n```").unwrap();
        assert_eq!(object["ok"], true);
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(matches!(
            parse_json_object(""),
            Err(LlmError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_json_object("[1, 2]"),
            Err(LlmError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_json_object("Sure! Here is the JSON"),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_from_config_selects_family() {
        let client = Client::new();

        let config = AgentLlmConfig::builder().provider("gemini").build();
        assert!(matches!(
            Provider::from_config(&config, client.clone()),
            Ok(Provider::Gemini(_))
        ));

        let config = AgentLlmConfig::builder().provider("ollama").build();
        assert!(matches!(
            Provider::from_config(&config, client.clone()),
            Ok(Provider::OpenAiCompatible(_))
        ));

        let config = AgentLlmConfig::builder().provider("nope").build();
        assert!(matches!(
            Provider::from_config(&config, client),
            Err(LlmError::UnsupportedProvider(p)) if p == "nope"
        ));
    }
}
