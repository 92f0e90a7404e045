//! One lead through every stage.

use std::sync::Arc;

use agent_tools::ToolRegistry;
use llm_router::LlmRouter;
use outreach_core::{format_memory_for_prompt, knowledge, MemoryQuery, MemoryStore};
use outreach_database::Lead;
use tracing::{debug, warn};

use crate::context::{CampaignBrief, DraftContext};
use crate::error::PipelineError;
use crate::stages::copywriter;
use crate::stages::lead_intelligence;
use crate::stages::reflection::{Reflection, ReflectionAgent};
use crate::stages::research::ResearchAgent;
use crate::stages::rewrite::{RewriteAgent, RewriteStatus};
use crate::stages::routing::RoutingAgent;
use crate::stages::supervisor::{Supervision, SupervisorAgent};
use crate::templates::TemplateSelector;

/// Memory patterns fed into each draft.
pub const MEMORY_LIMIT: i64 = 5;

/// Everything the pipeline produced for one lead.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub lead_id: i64,
    pub subject: String,
    pub body: String,
    pub template_source: String,
    pub rewrite_status: RewriteStatus,
    pub reflection: Reflection,
    pub supervision: Supervision,
    /// Memory entries that were read into the context.
    pub memory_ids: Vec<i64>,
    /// Whether web research returned a result (not just the knowledge hook).
    pub has_research_result: bool,
    pub context: DraftContext,
}

pub struct DraftPipeline {
    research: ResearchAgent,
    routing: RoutingAgent,
    rewrite: RewriteAgent,
    reflection: ReflectionAgent,
    supervisor: SupervisorAgent,
    memory: Arc<dyn MemoryStore>,
    templates: TemplateSelector,
    sender_name: String,
    product_name: String,
}

impl DraftPipeline {
    pub fn new(
        router: Arc<LlmRouter>,
        tools: Arc<ToolRegistry>,
        memory: Arc<dyn MemoryStore>,
        templates: TemplateSelector,
    ) -> Self {
        Self {
            research: ResearchAgent::new(router.clone(), tools),
            routing: RoutingAgent::new(router.clone()),
            rewrite: RewriteAgent::new(router.clone()),
            reflection: ReflectionAgent::new(router.clone()),
            supervisor: SupervisorAgent::new(router),
            memory,
            templates,
            sender_name: String::new(),
            product_name: String::new(),
        }
    }

    /// Names exposed to templates as `sender_name` and `product_name`.
    pub fn with_identity(mut self, sender_name: impl Into<String>, product_name: impl Into<String>) -> Self {
        self.sender_name = sender_name.into();
        self.product_name = product_name.into();
        self
    }

    /// Run every stage for one lead.
    ///
    /// Only template defects (unreadable file, undefined variable) fail;
    /// model, tool and memory failures fall back inside their stage.
    pub async fn run(
        &self,
        lead: &Lead,
        campaign: &CampaignBrief,
        owner_key: &str,
    ) -> Result<PipelineOutput, PipelineError> {
        let profile = lead_intelligence::enrich(lead);
        let channel = campaign.channel.as_str();

        let research = self
            .research
            .research(&profile, channel, &campaign.purpose)
            .await;
        let has_research_result = !research.research_source_link.is_empty();

        let template = self.templates.select(
            &profile.specialty,
            &campaign.subject_template,
            &campaign.body_template,
        )?;

        let mut context = DraftContext::new(
            &profile,
            campaign,
            research,
            owner_key,
            &self.sender_name,
            &self.product_name,
        );

        let routing = self.routing.route(&context).await;
        context.apply_routing(routing);

        let seed = context.seed_context();
        let query = MemoryQuery::new(
            seed.owner_key,
            seed.channel,
            &seed.purpose,
            &seed.specialty,
            MEMORY_LIMIT,
        );
        let memories = match self.memory.list_for_context(&query).await {
            Ok(memories) => memories,
            Err(e) => {
                warn!("Memory lookup failed for lead {}: {}", profile.id, e);
                Vec::new()
            }
        };
        context.memory_patterns = format_memory_for_prompt(&memories);

        let kb = knowledge::build_context(&context.channel, &context.purpose, &context.specialty);
        context.apply_knowledge(&kb);

        let (subject, body) = copywriter::draft(&template.subject, &template.body, &context)?;

        let rewrite = self.rewrite.maybe_rewrite(&subject, &body, &context).await;
        let reflected = self
            .reflection
            .critique_and_refine(&rewrite.subject, &rewrite.body, &context)
            .await;
        let supervision = self
            .supervisor
            .review(&reflected.subject, &reflected.body, &context)
            .await;

        debug!(
            "Lead {}: template={} rewrite={} reflection={} supervision={:.2}",
            profile.id,
            template.source,
            rewrite.status,
            reflected.reflection.mode.as_str(),
            supervision.score
        );

        Ok(PipelineOutput {
            lead_id: profile.id,
            subject: reflected.subject,
            body: reflected.body,
            template_source: template.source,
            rewrite_status: rewrite.status,
            reflection: reflected.reflection,
            supervision,
            memory_ids: memories.iter().map(|memory| memory.id).collect(),
            has_research_result,
            context,
        })
    }
}
