//! Agent LLM configuration: provider presets and per-owner resolution.

use outreach_core::{AgentSettings, Settings};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

/// Default system prompt for the research query agent.
pub const DEFAULT_PROMPT_SEARCH: &str = "You are a search agent for B2B medical outreach. Create one concise, high-signal web query for this lead.";

/// Default system prompt for the routing agent.
pub const DEFAULT_PROMPT_ROUTING: &str = "You are a routing agent. Decide best messaging angle and channel strategy for this lead and campaign.";

/// Default system prompt for the supervisor agent.
pub const DEFAULT_PROMPT_SUPERVISOR: &str = "You are a supervisor agent. Evaluate if the outreach draft is safe, credible, and personalized.";

/// Default system prompt for the rewrite agent.
pub const DEFAULT_PROMPT_REWRITE: &str =
    "You are a rewrite agent. Rewrite drafts to be concise, human, and trustworthy.";

/// Provider used when nothing else is configured.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Wire protocol spoken by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    /// `/chat/completions` with `response_format=json_object`.
    OpenAiCompatible,
    /// `/v1/messages`.
    Anthropic,
    /// `generateContent`.
    Gemini,
}

/// A known provider with its default endpoint and models.
#[derive(Debug, Clone, Copy)]
pub struct ProviderPreset {
    pub id: &'static str,
    pub base_url: &'static str,
    pub models: &'static [&'static str],
    pub family: ProviderFamily,
    /// Self-hosted inference servers run without a key.
    pub requires_api_key: bool,
}

/// All supported providers, in display order.
pub const PROVIDER_PRESETS: &[ProviderPreset] = &[
    ProviderPreset {
        id: "openai",
        base_url: "https://api.openai.com/v1",
        models: &["gpt-4o-mini", "gpt-4.1-mini"],
        family: ProviderFamily::OpenAiCompatible,
        requires_api_key: true,
    },
    ProviderPreset {
        id: "openrouter",
        base_url: "https://openrouter.ai/api/v1",
        models: &["openai/gpt-4.1-mini", "anthropic/claude-3.5-sonnet"],
        family: ProviderFamily::OpenAiCompatible,
        requires_api_key: true,
    },
    ProviderPreset {
        id: "groq",
        base_url: "https://api.groq.com/openai/v1",
        models: &["llama-3.3-70b-versatile"],
        family: ProviderFamily::OpenAiCompatible,
        requires_api_key: true,
    },
    ProviderPreset {
        id: "together",
        base_url: "https://api.together.xyz/v1",
        models: &["meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo"],
        family: ProviderFamily::OpenAiCompatible,
        requires_api_key: true,
    },
    ProviderPreset {
        id: "ollama",
        base_url: "http://127.0.0.1:11434/v1",
        models: &["llama3.1:8b"],
        family: ProviderFamily::OpenAiCompatible,
        requires_api_key: false,
    },
    ProviderPreset {
        id: "vllm",
        base_url: "http://127.0.0.1:8000/v1",
        models: &["my-vllm-model"],
        family: ProviderFamily::OpenAiCompatible,
        requires_api_key: false,
    },
    ProviderPreset {
        id: "anthropic",
        base_url: "https://api.anthropic.com",
        models: &["claude-3-5-sonnet-latest"],
        family: ProviderFamily::Anthropic,
        requires_api_key: true,
    },
    ProviderPreset {
        id: "gemini",
        base_url: "https://generativelanguage.googleapis.com",
        models: &["gemini-1.5-flash"],
        family: ProviderFamily::Gemini,
        requires_api_key: true,
    },
];

/// Look up a preset by provider id.
pub fn find_preset(provider: &str) -> Option<&'static ProviderPreset> {
    PROVIDER_PRESETS.iter().find(|preset| preset.id == provider)
}

fn default_preset() -> &'static ProviderPreset {
    &PROVIDER_PRESETS[0]
}

/// A provider choice for operator-facing pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderOption {
    pub id: String,
    pub label: String,
}

/// List every supported provider with a display label.
pub fn list_provider_options() -> Vec<ProviderOption> {
    PROVIDER_PRESETS
        .iter()
        .map(|preset| ProviderOption {
            id: preset.id.to_string(),
            label: provider_label(preset.id),
        })
        .collect()
}

fn provider_label(id: &str) -> String {
    if id == "vllm" {
        return "vLLM".to_string();
    }
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Resolved LLM configuration for one pipeline invocation.
///
/// Never mutated after resolution.
#[derive(Debug, Clone)]
pub struct AgentLlmConfig {
    /// Lower-cased provider id.
    pub provider: String,
    pub base_url: String,
    api_key: Option<SecretString>,
    /// Models tried in order.
    pub models: Vec<String>,
    pub enable_web_research: bool,
    pub enable_llm_rewrite: bool,
    pub prompt_search: String,
    pub prompt_routing: String,
    pub prompt_supervisor: String,
    pub prompt_rewrite: String,
}

impl Default for AgentLlmConfig {
    fn default() -> Self {
        let preset = default_preset();
        Self {
            provider: preset.id.to_string(),
            base_url: preset.base_url.to_string(),
            api_key: None,
            models: preset.models.iter().map(|m| m.to_string()).collect(),
            enable_web_research: false,
            enable_llm_rewrite: false,
            prompt_search: DEFAULT_PROMPT_SEARCH.to_string(),
            prompt_routing: DEFAULT_PROMPT_ROUTING.to_string(),
            prompt_supervisor: DEFAULT_PROMPT_SUPERVISOR.to_string(),
            prompt_rewrite: DEFAULT_PROMPT_REWRITE.to_string(),
        }
    }
}

impl AgentLlmConfig {
    /// Create a new config builder.
    pub fn builder() -> AgentLlmConfigBuilder {
        AgentLlmConfigBuilder::default()
    }

    /// Get the API key (exposes the secret).
    pub(crate) fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .filter(|key| !key.is_empty())
    }

    /// Whether an API key was resolved.
    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    /// The preset for this provider, if it is a known one.
    pub fn preset(&self) -> Option<&'static ProviderPreset> {
        find_preset(&self.provider)
    }
}

/// Builder for AgentLlmConfig.
#[derive(Debug, Default)]
pub struct AgentLlmConfigBuilder {
    config: AgentLlmConfig,
}

impl AgentLlmConfigBuilder {
    /// Set the provider id.
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.config.provider = provider.into().trim().to_lowercase();
        self
    }

    /// Set the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Set the ordered model list.
    pub fn models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.models = models.into_iter().map(Into::into).collect();
        self
    }

    /// Enable web research.
    pub fn enable_web_research(mut self, enable: bool) -> Self {
        self.config.enable_web_research = enable;
        self
    }

    /// Enable the LLM rewrite pass.
    pub fn enable_llm_rewrite(mut self, enable: bool) -> Self {
        self.config.enable_llm_rewrite = enable;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> AgentLlmConfig {
        self.config
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Merge owner overrides onto the provider preset and global defaults.
///
/// Resolution order:
/// - provider: owner, then global default, then `openai`
/// - models: owner list (blanks dropped), then preset, then global list
/// - base URL: owner, then preset, then global
/// - API key: owner, then global
/// - flags: owner when set, then global
/// - prompts: owner when non-empty, then the built-in default
///
/// An unknown provider id keeps its name (so router construction can reject
/// it) but borrows the `openai` preset for URL and models.
pub fn resolve_agent_llm_config(
    owner: Option<&AgentSettings>,
    defaults: &Settings,
) -> AgentLlmConfig {
    let provider = owner
        .and_then(|row| non_empty(row.llm_provider.as_ref()))
        .or_else(|| non_empty(Some(&defaults.llm_provider)))
        .unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
        .to_lowercase();
    let preset = find_preset(&provider).unwrap_or_else(default_preset);

    let owner_models: Vec<String> = owner
        .map(|row| {
            row.llm_models
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let models = if !owner_models.is_empty() {
        owner_models
    } else if !preset.models.is_empty() {
        preset.models.iter().map(|m| m.to_string()).collect()
    } else {
        defaults.llm_models.clone()
    };

    let base_url = owner
        .and_then(|row| non_empty(row.llm_base_url.as_ref()))
        .or_else(|| (!preset.base_url.is_empty()).then(|| preset.base_url.to_string()))
        .or_else(|| non_empty(defaults.llm_base_url.as_ref()))
        .unwrap_or_default();

    let api_key = owner
        .and_then(|row| non_empty(row.llm_api_key.as_ref()))
        .map(SecretString::from)
        .or_else(|| defaults.llm_api_key.clone());

    let prompt = |value: Option<&String>, fallback: &str| {
        non_empty(value).unwrap_or_else(|| fallback.to_string())
    };

    AgentLlmConfig {
        provider,
        base_url,
        api_key,
        models,
        enable_web_research: owner
            .and_then(|row| row.enable_web_research)
            .unwrap_or(defaults.enable_web_research),
        enable_llm_rewrite: owner
            .and_then(|row| row.enable_llm_rewrite)
            .unwrap_or(defaults.enable_llm_rewrite),
        prompt_search: prompt(
            owner.and_then(|row| row.prompt_search.as_ref()),
            DEFAULT_PROMPT_SEARCH,
        ),
        prompt_routing: prompt(
            owner.and_then(|row| row.prompt_routing.as_ref()),
            DEFAULT_PROMPT_ROUTING,
        ),
        prompt_supervisor: prompt(
            owner.and_then(|row| row.prompt_supervisor.as_ref()),
            DEFAULT_PROMPT_SUPERVISOR,
        ),
        prompt_rewrite: prompt(
            owner.and_then(|row| row.prompt_rewrite.as_ref()),
            DEFAULT_PROMPT_REWRITE,
        ),
    }
}
