//! Supervision stage: final approval score for a draft.

use std::sync::Arc;

use llm_router::LlmRouter;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::{number_field, text_field};
use crate::context::DraftContext;

/// Score at or above which a draft counts as approved.
pub const APPROVAL_THRESHOLD: f64 = 0.5;

/// Score at or above which a persisted draft seeds outreach memory.
pub const MEMORY_SEED_THRESHOLD: f64 = 0.78;

const HEURISTIC_NOTES: &str = "heuristic fallback";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Supervision {
    pub status: String,
    pub score: f64,
    pub notes: String,
}

impl Supervision {
    pub fn seeds_memory(&self) -> bool {
        self.score >= MEMORY_SEED_THRESHOLD
    }
}

fn status_for(score: f64) -> String {
    if score >= APPROVAL_THRESHOLD {
        "approved".to_string()
    } else {
        "needs_revision".to_string()
    }
}

/// Length-only score used when no model answers.
pub fn heuristic_score(subject: &str, body: &str) -> f64 {
    if body.chars().count() > 120 && subject.chars().count() > 8 {
        0.6
    } else {
        0.3
    }
}

pub fn heuristic_review(subject: &str, body: &str) -> Supervision {
    let score = heuristic_score(subject, body);
    Supervision {
        status: status_for(score),
        score,
        notes: HEURISTIC_NOTES.to_string(),
    }
}

pub struct SupervisorAgent {
    router: Arc<LlmRouter>,
}

impl SupervisorAgent {
    pub fn new(router: Arc<LlmRouter>) -> Self {
        Self { router }
    }

    pub async fn review(&self, subject: &str, body: &str, context: &DraftContext) -> Supervision {
        let payload = json!({
            "subject": subject,
            "body": body,
            "lead": {
                "full_name": context.full_name,
                "specialty": context.specialty,
                "city": context.city,
            },
            "channel": context.channel,
            "knowledge": {
                "principles": context.knowledge_principles,
                "objection_handling": context.knowledge_objection_handling,
                "followup_plan": context.knowledge_followup_plan,
            },
            "output_schema": {
                "status": "approved|needs_revision",
                "score": "float_0_to_1",
                "notes": "string",
            },
        });

        let Some(result) = self
            .router
            .run_json_task(&self.router.config().prompt_supervisor, &payload, 0.1)
            .await
        else {
            return heuristic_review(subject, body);
        };

        let score = number_field(&result, "score")
            .unwrap_or_else(|| heuristic_score(subject, body))
            .clamp(0.0, 1.0);
        let status = text_field(&result, "status").unwrap_or_else(|| status_for(score));
        let notes = text_field(&result, "notes").unwrap_or_default();

        debug!("Supervisor scored draft {:.2} ({})", score, status);
        Supervision {
            status,
            score,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CampaignBrief, LeadProfile, Research};
    use crate::stages::test_support::{offline_router, router, PromptExecutor};
    use outreach_core::Channel;
    use serde_json::Value;

    fn context() -> DraftContext {
        let lead = LeadProfile {
            id: 1,
            full_name: "Dr. Amine Kaci".to_string(),
            first_name: "Amine".to_string(),
            last_name: "Kaci".to_string(),
            email: "a@example.com".to_string(),
            phone: String::new(),
            specialty: "Cardiologist".to_string(),
            city: "Algiers".to_string(),
            address: String::new(),
            source_hash: String::new(),
            personalization_hook: String::new(),
        };
        let campaign = CampaignBrief {
            id: 1,
            channel: Channel::Email,
            purpose: String::new(),
            subject_template: String::new(),
            body_template: String::new(),
        };
        DraftContext::new(&lead, &campaign, Research::default(), "global", "Sam", "Acme")
    }

    fn scripted(response: Value) -> SupervisorAgent {
        SupervisorAgent::new(router(
            PromptExecutor::new(vec![("supervisor agent", response)]),
            false,
            false,
        ))
    }

    #[tokio::test]
    async fn test_offline_heuristic() {
        let agent = SupervisorAgent::new(offline_router());

        let long = agent
            .review("Quick question", &"b".repeat(121), &context())
            .await;
        assert_eq!(long.score, 0.6);
        assert_eq!(long.status, "approved");
        assert_eq!(long.notes, "heuristic fallback");

        let short = agent.review("Hi", &"b".repeat(121), &context()).await;
        assert_eq!(short.score, 0.3);
        assert_eq!(short.status, "needs_revision");
    }

    #[tokio::test]
    async fn test_score_clamped_and_status_derived() {
        let supervision = scripted(json!({"score": 1.7}))
            .review("S", "B", &context())
            .await;
        assert_eq!(supervision.score, 1.0);
        assert_eq!(supervision.status, "approved");
        assert!(supervision.seeds_memory());
    }

    #[tokio::test]
    async fn test_missing_score_uses_heuristic() {
        let supervision = scripted(json!({"status": "needs_revision", "notes": "too vague"}))
            .review("S", "B", &context())
            .await;
        assert_eq!(supervision.score, 0.3);
        assert_eq!(supervision.status, "needs_revision");
        assert_eq!(supervision.notes, "too vague");
    }

    #[tokio::test]
    async fn test_payload_carries_knowledge() {
        let executor = PromptExecutor::new(vec![("supervisor agent", json!({"score": 0.7}))]);
        let agent = SupervisorAgent::new(router(executor.clone(), false, false));

        let mut ctx = context();
        ctx.knowledge_principles = vec!["Be specific".to_string()];
        ctx.knowledge_objection_handling = vec!["Too busy: offer async".to_string()];
        ctx.knowledge_followup_plan = vec!["Day 3: short nudge".to_string()];
        agent.review("S", "B", &ctx).await;

        let payloads = executor.payloads.lock().await;
        let sent: Value = serde_json::from_str(&payloads[0].0).unwrap();
        assert_eq!(sent["knowledge"]["principles"][0], "Be specific");
        assert_eq!(sent["knowledge"]["objection_handling"][0], "Too busy: offer async");
        assert_eq!(sent["knowledge"]["followup_plan"][0], "Day 3: short nudge");
        assert_eq!(payloads[0].1, 0.1);
    }

    #[test]
    fn test_memory_threshold() {
        let at = |score| Supervision {
            status: "approved".to_string(),
            score,
            notes: String::new(),
        };
        assert!(at(0.78).seeds_memory());
        assert!(!at(0.77).seeds_memory());
    }
}
