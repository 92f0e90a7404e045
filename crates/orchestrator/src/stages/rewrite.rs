//! Rewrite stage: optional model polish behind a quality gate.

use std::fmt;
use std::sync::Arc;

use llm_router::LlmRouter;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::{number_field, text_field};
use crate::context::DraftContext;

/// Phrases that make a rewrite unacceptable (case-insensitive).
pub const SPAMMY_TERMS: &[&str] = &[
    "guaranteed",
    "limited time",
    "act now",
    "buy now",
    "winner",
    "risk-free",
    "100%",
];

pub const MIN_CONFIDENCE: f64 = 0.55;
pub const MIN_SUBJECT_CHARS: usize = 8;
pub const MIN_BODY_CHARS: usize = 120;

const JSON_INSTRUCTION: &str = " Return strict JSON with keys: subject, body, confidence. confidence is a float between 0 and 1.";

/// Why the draft did or did not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteStatus {
    Disabled,
    FallbackNoResponse,
    FallbackQualityGate,
    Rewritten,
}

impl RewriteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteStatus::Disabled => "disabled",
            RewriteStatus::FallbackNoResponse => "fallback_no_response",
            RewriteStatus::FallbackQualityGate => "fallback_quality_gate",
            RewriteStatus::Rewritten => "rewritten",
        }
    }
}

impl fmt::Display for RewriteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub subject: String,
    pub body: String,
    pub status: RewriteStatus,
}

/// Whether a proposed rewrite is good enough to replace the draft.
pub fn passes_quality_gate(subject: &str, body: &str, confidence: f64) -> bool {
    if confidence < MIN_CONFIDENCE {
        return false;
    }
    if subject.chars().count() < MIN_SUBJECT_CHARS || body.chars().count() < MIN_BODY_CHARS {
        return false;
    }

    let combined = format!("{} {}", subject, body).to_lowercase();
    !SPAMMY_TERMS.iter().any(|term| combined.contains(term))
}

pub struct RewriteAgent {
    router: Arc<LlmRouter>,
}

impl RewriteAgent {
    pub fn new(router: Arc<LlmRouter>) -> Self {
        Self { router }
    }

    /// Propose a rewrite; keep the original unless it passes the gate.
    pub async fn maybe_rewrite(&self, subject: &str, body: &str, context: &DraftContext) -> RewriteOutcome {
        let unchanged = |status| RewriteOutcome {
            subject: subject.to_string(),
            body: body.to_string(),
            status,
        };

        let config = self.router.config();
        if !config.enable_llm_rewrite {
            return unchanged(RewriteStatus::Disabled);
        }

        let payload = json!({
            "goal": "polish outreach while keeping specific details",
            "tone": "professional, warm, concise, not robotic, not overly salesy",
            "lead_context": {
                "full_name": context.full_name,
                "specialty": context.specialty,
                "city": context.city,
                "research_snippet": context.research_snippet,
            },
            "draft": {"subject": subject, "body": body},
            "knowledge": {
                "principles": context.knowledge_principles,
                "cta_examples": context.knowledge_cta_examples,
            },
            "memory_patterns": context.memory_patterns,
        });
        let system_prompt = format!("{}{}", config.prompt_rewrite, JSON_INSTRUCTION);

        let Some(result) = self.router.run_json_task(&system_prompt, &payload, 0.6).await else {
            return unchanged(RewriteStatus::FallbackNoResponse);
        };

        let new_subject = text_field(&result, "subject").unwrap_or_default();
        let new_body = text_field(&result, "body").unwrap_or_default();
        let confidence = number_field(&result, "confidence").unwrap_or(0.0);

        if !passes_quality_gate(&new_subject, &new_body, confidence) {
            warn!(
                "Rewrite rejected by quality gate (confidence {:.2}, subject {} chars, body {} chars)",
                confidence,
                new_subject.chars().count(),
                new_body.chars().count()
            );
            return unchanged(RewriteStatus::FallbackQualityGate);
        }

        info!("Rewrite accepted with confidence {:.2}", confidence);
        RewriteOutcome {
            subject: new_subject,
            body: new_body,
            status: RewriteStatus::Rewritten,
        }
    }
}
