//! Reflection stage: self-critique, with a heuristic clean-up fallback.

use std::sync::Arc;

use llm_router::LlmRouter;
use outreach_core::knowledge::CTA_EXAMPLES;
use outreach_core::{collapse_whitespace, truncate_chars};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::{number_field, text_field};
use crate::context::DraftContext;

const SYSTEM_PROMPT: &str = "You are a reflection agent. Critique and improve this draft using provided knowledge and memory patterns. Keep facts unchanged. Return strict JSON.";

pub const MIN_CONFIDENCE: f64 = 0.45;
pub const MIN_BODY_CHARS: usize = 80;
pub const MAX_SUBJECT_CHARS: usize = 120;
pub const MIN_SUBJECT_CHARS: usize = 8;
pub const MAX_BODY_CHARS: usize = 420;
pub const HEURISTIC_CONFIDENCE: f64 = 0.62;

// Used when the model omits confidence or reports zero.
const MISSING_CONFIDENCE: f64 = 0.55;
const STOCK_SUBJECT: &str = "Quick question for your practice";
const OPT_IN_PHRASE: &str = "would you be open to";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReflectionMode {
    Llm,
    Heuristic,
}

impl ReflectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReflectionMode::Llm => "llm",
            ReflectionMode::Heuristic => "heuristic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reflection {
    pub mode: ReflectionMode,
    pub critique: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionOutcome {
    pub subject: String,
    pub body: String,
    pub reflection: Reflection,
}

/// Deterministic clean-up of a draft. Always succeeds.
///
/// Collapses subject whitespace (max 120 chars, stock subject under 8),
/// trims trailing whitespace per body line, cuts a long body to 420 chars
/// plus `...`, and appends a CTA when the body asks nothing.
pub fn heuristic_refine(subject: &str, body: &str, cta_examples: &[String]) -> ReflectionOutcome {
    let mut notes: Vec<&str> = Vec::new();

    let mut subject = truncate_chars(&collapse_whitespace(subject), MAX_SUBJECT_CHARS);
    let mut body = body
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    if subject.chars().count() < MIN_SUBJECT_CHARS {
        subject = STOCK_SUBJECT.to_string();
        notes.push("Subject too short; replaced with clear non-hype subject.");
    }

    if body.chars().count() > MAX_BODY_CHARS {
        body = format!("{}...", truncate_chars(&body, MAX_BODY_CHARS).trim_end());
        notes.push("Body shortened for first-touch readability.");
    }

    if !body.contains('?') && !body.to_lowercase().contains(OPT_IN_PHRASE) {
        let cta = cta_examples
            .first()
            .map(String::as_str)
            .unwrap_or(CTA_EXAMPLES[0]);
        body = format!("{}\n\n{}", body, cta).trim().to_string();
        notes.push("Added clear low-friction CTA.");
    }

    if notes.is_empty() {
        notes.push("Heuristic reflection found no critical issues.");
    }

    ReflectionOutcome {
        subject,
        body,
        reflection: Reflection {
            mode: ReflectionMode::Heuristic,
            critique: notes.join(" "),
            confidence: HEURISTIC_CONFIDENCE,
        },
    }
}

pub struct ReflectionAgent {
    router: Arc<LlmRouter>,
}

impl ReflectionAgent {
    pub fn new(router: Arc<LlmRouter>) -> Self {
        Self { router }
    }

    /// Ask the model to critique and revise; fall back to
    /// [`heuristic_refine`] on no response or a weak revision.
    pub async fn critique_and_refine(
        &self,
        subject: &str,
        body: &str,
        context: &DraftContext,
    ) -> ReflectionOutcome {
        let payload = json!({
            "goal": "Self-critique and refine outreach draft before approval",
            "draft": {"subject": subject, "body": body},
            "lead_context": {
                "full_name": context.full_name,
                "specialty": context.specialty,
                "city": context.city,
            },
            "constraints": {
                "tone": "human, specific, respectful, concise",
                "avoid": ["hype", "spam phrases", "generic claims"],
            },
            "knowledge": {
                "principles": context.knowledge_principles,
                "cta_examples": context.knowledge_cta_examples,
                "followup_plan": context.knowledge_followup_plan,
            },
            "memory_patterns": context.memory_patterns,
            "output_schema": {
                "subject": "string",
                "body": "string",
                "critique": "string",
                "confidence": "float_0_to_1",
            },
        });

        let Some(result) = self.router.run_json_task(SYSTEM_PROMPT, &payload, 0.2).await else {
            return heuristic_refine(subject, body, &context.knowledge_cta_examples);
        };

        let new_subject = text_field(&result, "subject").unwrap_or_else(|| subject.trim().to_string());
        let new_body = text_field(&result, "body").unwrap_or_else(|| body.trim().to_string());
        let critique = text_field(&result, "critique").unwrap_or_else(|| "llm_reflection".to_string());
        let confidence = number_field(&result, "confidence")
            .filter(|confidence| *confidence != 0.0)
            .unwrap_or(MISSING_CONFIDENCE);

        if confidence < MIN_CONFIDENCE || new_body.chars().count() < MIN_BODY_CHARS {
            debug!(
                "Reflection revision too weak (confidence {:.2}); using heuristic",
                confidence
            );
            return heuristic_refine(subject, body, &context.knowledge_cta_examples);
        }

        ReflectionOutcome {
            subject: new_subject,
            body: new_body,
            reflection: Reflection {
                mode: ReflectionMode::Llm,
                critique,
                confidence: confidence.clamp(0.0, 1.0),
            },
        }
    }
}
