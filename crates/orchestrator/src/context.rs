//! Values passed between pipeline stages.

use std::str::FromStr;

use outreach_core::{Channel, CoreError, KnowledgeContext, SeedContext};
use outreach_database::Campaign;
use serde::Serialize;

/// Owner used when a generation request names none.
pub const DEFAULT_OWNER_KEY: &str = "global";

/// A lead after enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadProfile {
    pub id: i64,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub specialty: String,
    pub city: String,
    pub address: String,
    pub source_hash: String,
    pub personalization_hook: String,
}

/// Output of the research stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Research {
    pub resource_link: String,
    pub research_snippet: String,
    pub research_source_link: String,
}

/// Output of the routing stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Routing {
    pub routing_angle: String,
    pub routing_cta: String,
}

/// The campaign fields the pipeline needs, with a validated channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignBrief {
    pub id: i64,
    pub channel: Channel,
    pub purpose: String,
    pub subject_template: String,
    pub body_template: String,
}

impl TryFrom<&Campaign> for CampaignBrief {
    type Error = CoreError;

    fn try_from(campaign: &Campaign) -> Result<Self, Self::Error> {
        Ok(Self {
            id: campaign.id,
            channel: Channel::from_str(&campaign.channel)?,
            purpose: campaign.purpose.clone().unwrap_or_default(),
            subject_template: campaign.subject_template.clone(),
            body_template: campaign.body_template.clone(),
        })
    }
}

/// Every variable a subject or body template can reference.
///
/// Serialized as the template context, so a field name here is a template
/// variable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftContext {
    pub first_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub specialty: String,
    pub city: String,
    pub address: String,
    pub channel: String,
    pub purpose: String,
    pub personalization_hook: String,
    pub resource_link: String,
    pub research_snippet: String,
    pub research_source_link: String,
    pub routing_angle: String,
    pub routing_cta: String,
    pub sender_name: String,
    pub product_name: String,
    pub owner_key: String,
    pub memory_patterns: Vec<String>,
    pub knowledge_principles: Vec<String>,
    pub knowledge_followup_plan: Vec<String>,
    pub knowledge_purpose_angles: Vec<String>,
    pub knowledge_specialty_hook: String,
    pub knowledge_objection_handling: Vec<String>,
    pub knowledge_cta_examples: Vec<String>,
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

impl DraftContext {
    /// Build the context for one lead. Routing, memory and knowledge fields
    /// start empty and are filled in by later stages.
    pub fn new(
        lead: &LeadProfile,
        campaign: &CampaignBrief,
        research: Research,
        owner_key: &str,
        sender_name: &str,
        product_name: &str,
    ) -> Self {
        Self {
            first_name: or_default(&lead.first_name, "Doctor"),
            full_name: or_default(&lead.full_name, "Doctor"),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            specialty: or_default(&lead.specialty, "your specialty"),
            city: or_default(&lead.city, "your city"),
            address: lead.address.clone(),
            channel: campaign.channel.as_str().to_string(),
            purpose: campaign.purpose.clone(),
            personalization_hook: lead.personalization_hook.clone(),
            resource_link: research.resource_link,
            research_snippet: research.research_snippet,
            research_source_link: research.research_source_link,
            routing_angle: String::new(),
            routing_cta: String::new(),
            sender_name: sender_name.to_string(),
            product_name: product_name.to_string(),
            owner_key: or_default(owner_key.trim(), DEFAULT_OWNER_KEY),
            memory_patterns: Vec::new(),
            knowledge_principles: Vec::new(),
            knowledge_followup_plan: Vec::new(),
            knowledge_purpose_angles: Vec::new(),
            knowledge_specialty_hook: String::new(),
            knowledge_objection_handling: Vec::new(),
            knowledge_cta_examples: Vec::new(),
        }
    }

    /// Copy knowledge base fields into the context.
    pub fn apply_knowledge(&mut self, knowledge: &KnowledgeContext) {
        self.knowledge_principles = knowledge.principles.clone();
        self.knowledge_followup_plan = knowledge.followup_plan.clone();
        self.knowledge_purpose_angles = knowledge.purpose_angles.clone();
        self.knowledge_specialty_hook = knowledge.specialty_hook.clone();
        self.knowledge_objection_handling = knowledge.objection_handling.clone();
        self.knowledge_cta_examples = knowledge.cta_examples.clone();
    }

    pub fn apply_routing(&mut self, routing: Routing) {
        self.routing_angle = routing.routing_angle;
        self.routing_cta = routing.routing_cta;
    }

    /// Key for memory lookups and new memory entries.
    pub fn seed_context(&self) -> SeedContext {
        SeedContext {
            owner_key: self.owner_key.clone(),
            channel: self.channel.clone(),
            purpose: self.purpose.clone(),
            specialty: self.specialty.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_database::Campaign;

    fn campaign(channel: &str) -> Campaign {
        Campaign {
            id: 7,
            name: "Intro".to_string(),
            purpose: None,
            channel: channel.to_string(),
            subject_template: "S".to_string(),
            body_template: "B".to_string(),
            status: "active".to_string(),
            created_at: "2026-01-01 00:00:00".to_string(),
        }
    }

    fn blank_lead() -> LeadProfile {
        LeadProfile {
            id: 1,
            full_name: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: "a@example.com".to_string(),
            phone: String::new(),
            specialty: String::new(),
            city: String::new(),
            address: String::new(),
            source_hash: String::new(),
            personalization_hook: "your medical practice".to_string(),
        }
    }

    #[test]
    fn test_campaign_brief_channel() {
        let brief = CampaignBrief::try_from(&campaign("WhatsApp")).unwrap();
        assert_eq!(brief.channel, Channel::Whatsapp);
        assert_eq!(brief.purpose, "");

        assert!(CampaignBrief::try_from(&campaign("sms")).is_err());
    }

    #[test]
    fn test_context_defaults() {
        let brief = CampaignBrief::try_from(&campaign("email")).unwrap();
        let context = DraftContext::new(&blank_lead(), &brief, Research::default(), " ", "Sam", "Acme");

        assert_eq!(context.first_name, "Doctor");
        assert_eq!(context.full_name, "Doctor");
        assert_eq!(context.specialty, "your specialty");
        assert_eq!(context.city, "your city");
        assert_eq!(context.owner_key, "global");
        assert_eq!(context.channel, "email");
        assert_eq!(context.seed_context().owner_key, "global");
    }
}
