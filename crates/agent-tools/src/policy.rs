//! Tool allow/deny policy.

use std::collections::HashSet;

use outreach_core::Settings;

/// Profile used when the configured one is unknown.
pub const DEFAULT_PROFILE: &str = "messaging";

/// Alias table applied after trimming and lower-casing.
const TOOL_NAME_ALIASES: &[(&str, &str)] = &[
    ("mail", "email"),
    ("wa", "whatsapp"),
    ("search", "web_search"),
    ("knowledge", "outreach_knowledge"),
    ("memory", "outreach_memory"),
    ("tg", "telegram"),
];

const MINIMAL_TOOLS: &[&str] = &["web_search"];

const MESSAGING_TOOLS: &[&str] = &[
    "email",
    "whatsapp",
    "telegram",
    "web_search",
    "outreach_knowledge",
    "outreach_memory",
];

const FULL_TOOLS: &[&str] = &["*"];

/// Tool names granted by a profile, or `None` for an unknown profile.
pub fn profile_tools(profile: &str) -> Option<&'static [&'static str]> {
    match profile {
        "minimal" => Some(MINIMAL_TOOLS),
        "messaging" => Some(MESSAGING_TOOLS),
        "full" => Some(FULL_TOOLS),
        _ => None,
    }
}

/// Canonical tool name: trimmed, lower-cased, aliases resolved.
pub fn normalize_tool_name(name: &str) -> String {
    let normalized = name.trim().to_lowercase();
    TOOL_NAME_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(normalized)
}

/// Which tools the registry may dispatch.
///
/// Effective allow-set = profile tools ∪ allow ∪ also_allow, minus deny.
/// `*` in the allow-set admits every tool that is not denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPolicy {
    pub profile: String,
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub also_allow: Vec<String>,
}

impl Default for ToolPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PROFILE)
    }
}

impl ToolPolicy {
    /// Create a policy for a profile with no extra allow/deny entries.
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into().trim().to_lowercase(),
            allow: Vec::new(),
            deny: Vec::new(),
            also_allow: Vec::new(),
        }
    }

    /// Build the policy from global settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.tool_profile.as_str())
            .allow_tools(settings.tools_allow.iter().cloned())
            .deny_tools(settings.tools_deny.iter().cloned())
    }

    pub fn allow_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow.extend(tools.into_iter().map(Into::into));
        self
    }

    pub fn deny_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deny.extend(tools.into_iter().map(Into::into));
        self
    }

    pub fn also_allow_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.also_allow.extend(tools.into_iter().map(Into::into));
        self
    }

    /// Profile tools plus explicit allow entries, normalized.
    pub fn effective_allowlist(&self) -> HashSet<String> {
        let profile = profile_tools(&self.profile)
            .or_else(|| profile_tools(DEFAULT_PROFILE))
            .unwrap_or_default();

        profile
            .iter()
            .map(|name| name.to_string())
            .chain(self.allow.iter().map(|name| normalize_tool_name(name)))
            .chain(self.also_allow.iter().map(|name| normalize_tool_name(name)))
            .collect()
    }

    /// Whether the tool passes this policy. Deny always wins.
    pub fn is_allowed(&self, tool: &str) -> bool {
        let normalized = normalize_tool_name(tool);
        if self
            .deny
            .iter()
            .any(|name| normalize_tool_name(name) == normalized)
        {
            return false;
        }

        let allowlist = self.effective_allowlist();
        allowlist.contains("*") || allowlist.contains(&normalized)
    }
}
