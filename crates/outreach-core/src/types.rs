//! Shared domain types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Delivery channel of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Whatsapp,
}

impl Channel {
    /// Lower-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Whatsapp => "whatsapp",
        }
    }

    /// Name of the tool that delivers messages on this channel.
    pub fn tool_name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Channel::Email),
            "whatsapp" => Ok(Channel::Whatsapp),
            other => Err(CoreError::InvalidChannel(other.to_string())),
        }
    }
}

/// Per-owner agent overrides as stored by the persistence layer.
///
/// Every field is optional; anything left unset falls through to the
/// provider preset and then to the global [`Settings`](crate::Settings).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentSettings {
    pub owner_key: String,
    pub llm_provider: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_models: Vec<String>,
    pub enable_web_research: Option<bool>,
    pub enable_llm_rewrite: Option<bool>,
    pub prompt_search: Option<String>,
    pub prompt_routing: Option<String>,
    pub prompt_supervisor: Option<String>,
    pub prompt_rewrite: Option<String>,
}
