//! Routing stage: pick the messaging angle and call to action.

use std::sync::Arc;

use llm_router::LlmRouter;
use outreach_core::knowledge::{self, CTA_EXAMPLES};
use serde_json::json;

use super::text_field;
use crate::context::{DraftContext, Routing};

const DEFAULT_ANGLE: &str = "practice growth";

pub struct RoutingAgent {
    router: Arc<LlmRouter>,
}

impl RoutingAgent {
    pub fn new(router: Arc<LlmRouter>) -> Self {
        Self { router }
    }

    /// Angle and CTA derived from the context and knowledge base alone.
    pub fn fallback(context: &DraftContext) -> Routing {
        let knowledge =
            knowledge::build_context(&context.channel, &context.purpose, &context.specialty);

        let routing_angle = if context.personalization_hook.is_empty() {
            knowledge
                .purpose_angles
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_ANGLE.to_string())
        } else {
            context.personalization_hook.clone()
        };

        let routing_cta = knowledge
            .cta_examples
            .first()
            .cloned()
            .unwrap_or_else(|| CTA_EXAMPLES[0].to_string());

        Routing {
            routing_angle,
            routing_cta,
        }
    }

    /// Ask the model for an angle and CTA; missing fields fall back.
    pub async fn route(&self, context: &DraftContext) -> Routing {
        let fallback = Self::fallback(context);
        let knowledge =
            knowledge::build_context(&context.channel, &context.purpose, &context.specialty);

        let payload = json!({
            "lead": {
                "full_name": context.full_name,
                "specialty": context.specialty,
                "city": context.city,
            },
            "campaign": {
                "channel": context.channel,
                "purpose": context.purpose,
            },
            "knowledge": {
                "principles": knowledge.principles,
                "followup_plan": knowledge.followup_plan,
                "purpose_angles": knowledge.purpose_angles,
                "specialty_hook": knowledge.specialty_hook,
                "cta_examples": knowledge.cta_examples,
            },
            "output_schema": {
                "routing_angle": "string",
                "routing_cta": "string",
            },
        });

        let Some(result) = self
            .router
            .run_json_task(&self.router.config().prompt_routing, &payload, 0.2)
            .await
        else {
            return fallback;
        };

        Routing {
            routing_angle: text_field(&result, "routing_angle").unwrap_or(fallback.routing_angle),
            routing_cta: text_field(&result, "routing_cta").unwrap_or(fallback.routing_cta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CampaignBrief, LeadProfile, Research};
    use crate::stages::test_support::{offline_router, router, PromptExecutor};
    use outreach_core::Channel;

    fn context(hook: &str, purpose: &str) -> DraftContext {
        let lead = LeadProfile {
            id: 1,
            full_name: "Dr. Amine Kaci".to_string(),
            first_name: "Dr.".to_string(),
            last_name: "Amine Kaci".to_string(),
            email: "a@example.com".to_string(),
            phone: String::new(),
            specialty: "Cardiologist".to_string(),
            city: "Algiers".to_string(),
            address: String::new(),
            source_hash: String::new(),
            personalization_hook: hook.to_string(),
        };
        let campaign = CampaignBrief {
            id: 1,
            channel: Channel::Email,
            purpose: purpose.to_string(),
            subject_template: String::new(),
            body_template: String::new(),
        };
        DraftContext::new(&lead, &campaign, Research::default(), "global", "Sam", "Acme")
    }

    #[tokio::test]
    async fn test_offline_routing_uses_hook() {
        let agent = RoutingAgent::new(offline_router());

        let routing = agent.route(&context("Cardiologist care in Algiers", "")).await;
        assert_eq!(routing.routing_angle, "Cardiologist care in Algiers");
        assert_eq!(routing.routing_cta, CTA_EXAMPLES[0]);
    }

    #[test]
    fn test_fallback_angle_order() {
        let with_purpose = RoutingAgent::fallback(&context("", "partnership"));
        assert_eq!(
            with_purpose.routing_angle,
            knowledge::purpose_angles("partnership")[0]
        );

        let bare = RoutingAgent::fallback(&context("", ""));
        assert_eq!(bare.routing_angle, "practice growth");
    }

    #[tokio::test]
    async fn test_model_routing_fills_missing_fields() {
        let executor = PromptExecutor::new(vec![(
            "routing agent",
            json!({"routing_angle": "shorter patient wait times"}),
        )]);
        let agent = RoutingAgent::new(router(executor.clone(), false, false));

        let routing = agent.route(&context("Cardiologist care in Algiers", "")).await;
        assert_eq!(routing.routing_angle, "shorter patient wait times");
        assert_eq!(routing.routing_cta, CTA_EXAMPLES[0]);
        assert_eq!(executor.payloads.lock().await[0].1, 0.2);
    }
}
