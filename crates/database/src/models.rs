//! Database models.

use std::fmt;
use std::str::FromStr;

use outreach_core::{AgentSettings, MemoryEntry};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A lead (prospective recipient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Lead {
    /// Auto-incrementing ID.
    pub id: i64,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Unique email address.
    pub email: String,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    /// Fingerprint of email, address, specialty and city.
    pub source_hash: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// Fields for inserting a lead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub source_hash: Option<String>,
}

/// An outreach campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Campaign {
    /// Auto-incrementing ID.
    pub id: i64,
    pub name: String,
    /// Free-form purpose (e.g. "lead generation").
    pub purpose: Option<String>,
    /// Delivery channel, `email` or `whatsapp`.
    pub channel: String,
    pub subject_template: String,
    pub body_template: String,
    /// Campaign status (e.g. "active").
    pub status: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// Fields for creating a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    pub purpose: Option<String>,
    pub channel: String,
    pub subject_template: String,
    pub body_template: String,
}

/// Lifecycle of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DraftStatus {
    Draft,
    Approved,
    Rejected,
    Sent,
    Failed,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Draft => "draft",
            DraftStatus::Approved => "approved",
            DraftStatus::Rejected => "rejected",
            DraftStatus::Sent => "sent",
            DraftStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DraftStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(DraftStatus::Draft),
            "approved" => Ok(DraftStatus::Approved),
            "rejected" => Ok(DraftStatus::Rejected),
            "sent" => Ok(DraftStatus::Sent),
            "failed" => Ok(DraftStatus::Failed),
            other => Err(format!("unknown draft status: {}", other)),
        }
    }
}

/// One generated message for a (campaign, lead) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Draft {
    /// Auto-incrementing ID.
    pub id: i64,
    pub campaign_id: i64,
    pub lead_id: i64,
    pub subject: String,
    pub body: String,
    pub status: DraftStatus,
    pub scheduled_at: Option<String>,
    pub approved_at: Option<String>,
    pub sent_at: Option<String>,
    /// Last delivery error, if any.
    pub error_message: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// A draft joined with the lead and campaign fields needed to deliver it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DraftDelivery {
    pub draft_id: i64,
    pub campaign_id: i64,
    pub lead_id: i64,
    pub subject: String,
    pub body: String,
    pub status: DraftStatus,
    pub scheduled_at: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub channel: String,
    pub purpose: Option<String>,
}

/// An audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Event {
    /// Auto-incrementing ID.
    pub id: i64,
    pub draft_id: Option<i64>,
    pub event_type: String,
    /// JSON payload.
    pub payload: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// Raw `agent_settings` row; models are stored as a JSON array.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub(crate) struct AgentSettingsRow {
    pub owner_key: String,
    pub llm_provider: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_models_json: String,
    pub enable_web_research: Option<bool>,
    pub enable_llm_rewrite: Option<bool>,
    pub prompt_search: Option<String>,
    pub prompt_routing: Option<String>,
    pub prompt_supervisor: Option<String>,
    pub prompt_rewrite: Option<String>,
}

impl From<AgentSettingsRow> for AgentSettings {
    fn from(row: AgentSettingsRow) -> Self {
        // A corrupt models column reads as "no override".
        let llm_models = serde_json::from_str(&row.llm_models_json).unwrap_or_default();
        Self {
            owner_key: row.owner_key,
            llm_provider: row.llm_provider,
            llm_base_url: row.llm_base_url,
            llm_api_key: row.llm_api_key,
            llm_models,
            enable_web_research: row.enable_web_research,
            enable_llm_rewrite: row.enable_llm_rewrite,
            prompt_search: row.prompt_search,
            prompt_routing: row.prompt_routing,
            prompt_supervisor: row.prompt_supervisor,
            prompt_rewrite: row.prompt_rewrite,
        }
    }
}

/// Raw `outreach_memory` row.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct MemoryRow {
    pub id: i64,
    pub owner_key: String,
    pub channel: String,
    pub purpose: String,
    pub specialty: String,
    pub pattern_text: String,
    pub quality_score: f64,
    pub source_event: String,
    pub usage_count: i64,
    pub last_used_at: Option<String>,
    pub created_at: String,
}

impl From<MemoryRow> for MemoryEntry {
    fn from(row: MemoryRow) -> Self {
        Self {
            id: row.id,
            owner_key: row.owner_key,
            channel: row.channel,
            purpose: row.purpose,
            specialty: row.specialty,
            pattern_text: row.pattern_text,
            quality_score: row.quality_score,
            source_event: row.source_event,
            usage_count: row.usage_count,
            last_used_at: row.last_used_at,
            created_at: row.created_at,
        }
    }
}
