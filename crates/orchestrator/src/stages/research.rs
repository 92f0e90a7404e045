//! Research stage: educational resource link plus an optional web snippet.

use std::sync::Arc;

use agent_tools::ToolRegistry;
use llm_router::LlmRouter;
use outreach_core::knowledge;
use serde_json::json;
use tracing::{debug, warn};

use super::text_field;
use crate::context::{LeadProfile, Research};

/// Specialty keyword to resource URL; the first match wins.
pub const SPECIALTY_RESOURCES: &[(&str, &str)] = &[
    ("dentiste", "https://www.who.int/news-room/fact-sheets/detail/oral-health"),
    ("cardio", "https://www.who.int/health-topics/cardiovascular-diseases"),
    ("nutrition", "https://www.who.int/news-room/fact-sheets/detail/healthy-diet"),
    ("diab", "https://www.who.int/health-topics/diabetes"),
    ("pedi", "https://www.who.int/health-topics/child-health"),
];

/// Resource used when no specialty keyword matches.
pub const DEFAULT_RESOURCE: &str = "https://www.who.int/health-topics/digital-health";

const QUERY_SUFFIX: &str = "doctor Algeria";

/// Resource link for a specialty.
pub fn resource_link(specialty: &str) -> &'static str {
    let specialty = specialty.to_lowercase();
    SPECIALTY_RESOURCES
        .iter()
        .find(|(keyword, _)| specialty.contains(keyword))
        .map(|(_, url)| *url)
        .unwrap_or(DEFAULT_RESOURCE)
}

/// Deterministic search query: name, specialty and city plus a locale suffix.
pub fn fallback_query(lead: &LeadProfile) -> String {
    [
        lead.full_name.as_str(),
        lead.specialty.as_str(),
        lead.city.as_str(),
        QUERY_SUFFIX,
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" ")
}

pub struct ResearchAgent {
    router: Arc<LlmRouter>,
    tools: Arc<ToolRegistry>,
}

impl ResearchAgent {
    pub fn new(router: Arc<LlmRouter>, tools: Arc<ToolRegistry>) -> Self {
        Self { router, tools }
    }

    /// Research a lead.
    ///
    /// With web research enabled, asks the model for a search query (or uses
    /// [`fallback_query`]) and takes the first result through the
    /// `web_search` tool. Without a snippet, the knowledge base specialty
    /// hook stands in.
    pub async fn research(&self, lead: &LeadProfile, channel: &str, purpose: &str) -> Research {
        let mut research = Research {
            resource_link: resource_link(&lead.specialty).to_string(),
            ..Research::default()
        };

        if self.router.config().enable_web_research {
            let query = self.search_query(lead).await;
            let result = self.tools.run("web_search", json!({"query": query})).await;
            if result.ok {
                research.research_snippet = result.data["snippet"].as_str().unwrap_or("").to_string();
                research.research_source_link = result.data["link"].as_str().unwrap_or("").to_string();
            } else {
                warn!(
                    "Web search failed for lead {}: {}",
                    lead.id,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }

        if research.research_snippet.is_empty() {
            research.research_snippet =
                knowledge::build_context(channel, purpose, &lead.specialty).specialty_hook;
        }

        research
    }

    async fn search_query(&self, lead: &LeadProfile) -> String {
        let payload = json!({
            "lead": {
                "full_name": lead.full_name,
                "specialty": lead.specialty,
                "city": lead.city,
            },
            "goal": "Generate one concise web search query for outreach personalization",
            "output_schema": {"query": "string"},
        });

        let generated = self
            .router
            .run_json_task(&self.router.config().prompt_search, &payload, 0.1)
            .await
            .and_then(|object| text_field(&object, "query"));

        match generated {
            Some(query) => {
                debug!("Model search query for lead {}: {}", lead.id, query);
                query
            }
            None => fallback_query(lead),
        }
    }
}
