//! Process-wide settings loaded once at startup.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;

use crate::error::CoreError;

/// Default number of leads drafted concurrently.
const DEFAULT_DRAFT_WORKERS: usize = 4;

/// Global defaults for the router, tool registry and pipeline.
///
/// Built once (usually via [`Settings::from_env`]) and passed by reference
/// into the components that need it. Per-owner agent settings are merged on
/// top of these values when a pipeline is built.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Default LLM provider id.
    pub llm_provider: String,
    /// Base URL override applied when no owner or preset value exists.
    pub llm_base_url: Option<String>,
    /// Global API key.
    pub llm_api_key: Option<SecretString>,
    /// Model list used when neither the owner nor the preset supplies one.
    pub llm_models: Vec<String>,
    /// Allow the research stage to search the web.
    pub enable_web_research: bool,
    /// Allow the optional LLM rewrite pass.
    pub enable_llm_rewrite: bool,
    /// Tool policy profile name (`minimal`, `messaging`, `full`).
    pub tool_profile: String,
    /// Explicitly allowed tools.
    pub tools_allow: Vec<String>,
    /// Explicitly denied tools.
    pub tools_deny: Vec<String>,
    /// Whether repeated identical tool calls are blocked.
    pub tool_loop_detection_enabled: bool,
    /// Capacity of the tool-call history window.
    pub tool_loop_history_size: usize,
    /// Identical calls within the window that trigger a block.
    pub tool_loop_critical_threshold: usize,
    /// Sender name exposed to templates.
    pub sender_name: String,
    /// Product name exposed to templates.
    pub product_name: String,
    /// Directory holding specialty templates.
    pub template_dir: PathBuf,
    /// Maximum leads drafted concurrently.
    pub draft_workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm_provider: "openai".to_string(),
            llm_base_url: None,
            llm_api_key: None,
            llm_models: Vec::new(),
            enable_web_research: false,
            enable_llm_rewrite: false,
            tool_profile: "messaging".to_string(),
            tools_allow: Vec::new(),
            tools_deny: Vec::new(),
            tool_loop_detection_enabled: true,
            tool_loop_history_size: 30,
            tool_loop_critical_threshold: 10,
            sender_name: "The Outreach Team".to_string(),
            product_name: "Cold Outreach".to_string(),
            template_dir: PathBuf::from("templates/specialties"),
            draft_workers: DEFAULT_DRAFT_WORKERS,
        }
    }
}

impl Settings {
    /// Create settings from environment variables.
    ///
    /// All variables are optional:
    /// - `COLD_OUTREACH_LLM_PROVIDER` - Provider id (default: openai)
    /// - `COLD_OUTREACH_LLM_BASE_URL` - Base URL override
    /// - `COLD_OUTREACH_LLM_API_KEY` - API key
    /// - `COLD_OUTREACH_LLM_MODELS` - Comma separated model list
    /// - `COLD_OUTREACH_ENABLE_WEB_RESEARCH` - Enable web research (default: false)
    /// - `COLD_OUTREACH_ENABLE_LLM_REWRITE` - Enable LLM rewrite (default: false)
    /// - `COLD_OUTREACH_TOOL_PROFILE` - Tool profile (default: messaging)
    /// - `COLD_OUTREACH_TOOLS_ALLOW` / `COLD_OUTREACH_TOOLS_DENY` - Comma separated tool names
    /// - `COLD_OUTREACH_TOOL_LOOP_DETECTION` - Enable loop detection (default: true)
    /// - `COLD_OUTREACH_TOOL_LOOP_HISTORY` - History window (default: 30)
    /// - `COLD_OUTREACH_TOOL_LOOP_THRESHOLD` - Critical threshold (default: 10)
    /// - `COLD_OUTREACH_SENDER_NAME` / `COLD_OUTREACH_PRODUCT_NAME` - Template values
    /// - `COLD_OUTREACH_TEMPLATE_DIR` - Specialty template directory
    /// - `COLD_OUTREACH_WORKERS` - Concurrent leads (default: 4)
    pub fn from_env() -> Result<Self, CoreError> {
        let defaults = Self::default();

        Ok(Self {
            llm_provider: env_string("COLD_OUTREACH_LLM_PROVIDER")
                .map(|p| p.to_lowercase())
                .unwrap_or(defaults.llm_provider),
            llm_base_url: env_string("COLD_OUTREACH_LLM_BASE_URL"),
            llm_api_key: env_string("COLD_OUTREACH_LLM_API_KEY").map(SecretString::from),
            llm_models: env_list("COLD_OUTREACH_LLM_MODELS"),
            enable_web_research: env_bool(
                "COLD_OUTREACH_ENABLE_WEB_RESEARCH",
                defaults.enable_web_research,
            ),
            enable_llm_rewrite: env_bool(
                "COLD_OUTREACH_ENABLE_LLM_REWRITE",
                defaults.enable_llm_rewrite,
            ),
            tool_profile: env_string("COLD_OUTREACH_TOOL_PROFILE")
                .map(|p| p.to_lowercase())
                .unwrap_or(defaults.tool_profile),
            tools_allow: env_list("COLD_OUTREACH_TOOLS_ALLOW"),
            tools_deny: env_list("COLD_OUTREACH_TOOLS_DENY"),
            tool_loop_detection_enabled: env_bool(
                "COLD_OUTREACH_TOOL_LOOP_DETECTION",
                defaults.tool_loop_detection_enabled,
            ),
            tool_loop_history_size: env_parse(
                "COLD_OUTREACH_TOOL_LOOP_HISTORY",
                defaults.tool_loop_history_size,
            )?,
            tool_loop_critical_threshold: env_parse(
                "COLD_OUTREACH_TOOL_LOOP_THRESHOLD",
                defaults.tool_loop_critical_threshold,
            )?,
            sender_name: env_string("COLD_OUTREACH_SENDER_NAME").unwrap_or(defaults.sender_name),
            product_name: env_string("COLD_OUTREACH_PRODUCT_NAME")
                .unwrap_or(defaults.product_name),
            template_dir: env_string("COLD_OUTREACH_TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_dir),
            draft_workers: env_parse("COLD_OUTREACH_WORKERS", defaults.draft_workers)?.max(1),
        })
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_list(name: &str) -> Vec<String> {
    env_string(name)
        .map(|raw| {
            raw.split(',')
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn env_bool(name: &str, default: bool) -> bool {
    env_string(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_parse<T>(name: &'static str, default: T) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(name) {
        Some(raw) => raw.parse().map_err(|e: T::Err| CoreError::InvalidSetting {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.llm_provider, "openai");
        assert!(settings.llm_api_key.is_none());
        assert!(settings.llm_models.is_empty());
        assert!(!settings.enable_web_research);
        assert!(!settings.enable_llm_rewrite);
        assert_eq!(settings.tool_profile, "messaging");
        assert!(settings.tool_loop_detection_enabled);
        assert_eq!(settings.tool_loop_history_size, 30);
        assert_eq!(settings.tool_loop_critical_threshold, 10);
        assert_eq!(settings.draft_workers, 4);
    }

    // Environment-based tests are combined into a single test to avoid
    // race conditions when tests run in parallel (env vars are process-global).
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_vars() {
            for name in [
                "COLD_OUTREACH_LLM_PROVIDER",
                "COLD_OUTREACH_LLM_MODELS",
                "COLD_OUTREACH_ENABLE_WEB_RESEARCH",
                "COLD_OUTREACH_TOOLS_DENY",
                "COLD_OUTREACH_TOOL_LOOP_THRESHOLD",
                "COLD_OUTREACH_WORKERS",
            ] {
                std::env::remove_var(name);
            }
        }

        // Scenario 1: nothing set, defaults used
        clear_vars();
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.llm_provider, "openai");
        assert!(settings.llm_models.is_empty());

        // Scenario 2: lists, flags and numbers
        clear_vars();
        std::env::set_var("COLD_OUTREACH_LLM_PROVIDER", "Groq");
        std::env::set_var("COLD_OUTREACH_LLM_MODELS", "a, b,,c");
        std::env::set_var("COLD_OUTREACH_ENABLE_WEB_RESEARCH", "1");
        std::env::set_var("COLD_OUTREACH_TOOLS_DENY", "email");
        std::env::set_var("COLD_OUTREACH_TOOL_LOOP_THRESHOLD", "4");
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.llm_provider, "groq");
        assert_eq!(settings.llm_models, vec!["a", "b", "c"]);
        assert!(settings.enable_web_research);
        assert_eq!(settings.tools_deny, vec!["email"]);
        assert_eq!(settings.tool_loop_critical_threshold, 4);

        // Scenario 3: unparsable number is a configuration error
        clear_vars();
        std::env::set_var("COLD_OUTREACH_WORKERS", "many");
        let result = Settings::from_env();
        assert!(matches!(
            result,
            Err(CoreError::InvalidSetting { name: "COLD_OUTREACH_WORKERS", .. })
        ));

        clear_vars();
    }
}
