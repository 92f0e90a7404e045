//! Sending approved drafts through the tool registry.

use std::str::FromStr;
use std::sync::Arc;

use agent_tools::ToolRegistry;
use chrono::{DateTime, Utc};
use outreach_core::{build_memory_seed, Channel, SeedContext};
use outreach_database::{draft, event, outreach_memory, Database, DraftDelivery, DraftStatus};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::approvals::format_timestamp;
use crate::context::DEFAULT_OWNER_KEY;
use crate::error::PipelineError;

/// Source event for memory captured from a delivered draft.
pub const SENT_SOURCE_EVENT: &str = "draft_sent";

/// Quality score given to memory captured from a delivered draft.
pub const SENT_MEMORY_SCORE: f64 = 0.8;

/// Result of one send attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendOutcome {
    pub draft_id: i64,
    pub channel: Channel,
    pub sent: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

pub struct DispatchService {
    db: Database,
    tools: Arc<ToolRegistry>,
    owner_key: String,
}

fn payload(channel: Channel, delivery: &DraftDelivery, dry_run: bool) -> Value {
    match channel {
        Channel::Email => json!({
            "to": delivery.email,
            "subject": delivery.subject,
            "body": delivery.body,
            "dry_run": dry_run,
        }),
        Channel::Whatsapp => json!({
            "to": delivery.phone.as_deref().unwrap_or(""),
            "body": delivery.body,
            "dry_run": dry_run,
        }),
    }
}

impl DispatchService {
    pub fn new(db: Database, tools: Arc<ToolRegistry>) -> Self {
        Self {
            db,
            tools,
            owner_key: DEFAULT_OWNER_KEY.to_string(),
        }
    }

    /// Owner that memory from delivered drafts is recorded under.
    pub fn with_owner(mut self, owner_key: impl Into<String>) -> Self {
        self.owner_key = owner_key.into();
        self
    }

    /// Send one approved draft.
    ///
    /// The draft must be `approved`. A non-ok tool result, including a
    /// policy or loop block, marks the draft `failed` and is reported in the
    /// outcome rather than as an `Err`.
    pub async fn send_approved(&self, draft_id: i64, dry_run: bool) -> Result<SendOutcome, PipelineError> {
        let pool = self.db.pool();
        let delivery = draft::get_delivery(pool, draft_id).await?;
        if delivery.status != DraftStatus::Approved {
            return Err(PipelineError::DraftState {
                id: draft_id,
                status: delivery.status,
                expected: DraftStatus::Approved,
            });
        }

        let channel = Channel::from_str(&delivery.channel)?;
        let result = self
            .tools
            .run(channel.tool_name(), payload(channel, &delivery, dry_run))
            .await;

        if result.ok {
            draft::mark_sent(pool, draft_id).await?;
            event::log_event(
                pool,
                &format!("{}_sent", channel),
                &json!({"to": result.data["to"], "dry_run": dry_run}),
                Some(draft_id),
            )
            .await?;
            self.remember(channel, &delivery).await;

            info!("Draft {} sent via {}", draft_id, channel);
            return Ok(SendOutcome {
                draft_id,
                channel,
                sent: true,
                error: None,
            });
        }

        let message = result
            .error
            .clone()
            .or_else(|| result.blocked_reason().map(str::to_string))
            .unwrap_or_else(|| "send failed".to_string());
        draft::mark_failed(pool, draft_id, &message).await?;
        event::log_event(
            pool,
            &format!("{}_failed", channel),
            &json!({"error": message, "reason": result.blocked_reason()}),
            Some(draft_id),
        )
        .await?;

        warn!("Draft {} failed via {}: {}", draft_id, channel, message);
        Ok(SendOutcome {
            draft_id,
            channel,
            sent: false,
            error: Some(message),
        })
    }

    /// Send every approved draft scheduled at or before `now`.
    pub async fn send_due(&self, now: DateTime<Utc>, dry_run: bool) -> Result<DispatchReport, PipelineError> {
        let due = draft::list_due_drafts(self.db.pool(), &format_timestamp(now), None).await?;
        info!("{} drafts due for sending", due.len());

        let mut report = DispatchReport::default();
        for delivery in due {
            match self.send_approved(delivery.draft_id, dry_run).await {
                Ok(outcome) if outcome.sent => report.sent += 1,
                Ok(_) => report.failed += 1,
                Err(e) => {
                    error!("Could not send draft {}: {}", delivery.draft_id, e);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    async fn remember(&self, channel: Channel, delivery: &DraftDelivery) {
        let seed = SeedContext {
            owner_key: self.owner_key.clone(),
            channel: channel.as_str().to_string(),
            purpose: delivery.purpose.clone().unwrap_or_default(),
            specialty: delivery.specialty.clone().unwrap_or_default(),
        };
        let candidate = build_memory_seed(
            &seed,
            &delivery.subject,
            &delivery.body,
            SENT_MEMORY_SCORE,
            SENT_SOURCE_EVENT,
        );
        if let Err(e) = outreach_memory::add_memory(self.db.pool(), &candidate).await {
            warn!("Failed to capture memory for draft {}: {}", delivery.draft_id, e);
        }
    }
}
