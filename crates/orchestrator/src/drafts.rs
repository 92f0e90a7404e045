//! Campaign draft generation.

use std::sync::Arc;

use agent_tools::ToolRegistry;
use llm_router::{resolve_agent_llm_config, JsonTaskExecutor, LlmRouter};
use outreach_core::{build_memory_seed, AgentSettings, Settings};
use outreach_database::{
    agent_settings, campaign, draft, event, lead, outreach_memory, Database, Lead,
};
use serde::Serialize;
use serde_json::json;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::context::{CampaignBrief, DEFAULT_OWNER_KEY};
use crate::error::PipelineError;
use crate::pipeline::{DraftPipeline, PipelineOutput};
use crate::templates::TemplateSelector;

/// Source event for memory captured from a high supervision score.
pub const SUPERVISED_SOURCE_EVENT: &str = "draft_supervised";

const DEFAULT_LIMIT: i64 = 50;

/// Knobs for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Maximum leads to load.
    pub limit: i64,
    /// Owner whose agent settings and memory apply; `global` when unset.
    pub owner_key: Option<String>,
    /// No new lead is started after this instant. In-flight leads finish.
    pub deadline: Option<Instant>,
    /// Concurrent leads; falls back to the configured worker count.
    pub workers: Option<usize>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            owner_key: None,
            deadline: None,
            workers: None,
        }
    }
}

/// Counts for one generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub created: usize,
    /// Leads that already had a draft for this campaign.
    pub ignored: usize,
    pub failed: usize,
    /// Leads not started because the deadline passed.
    pub skipped: usize,
}

enum LeadOutcome {
    Created,
    Ignored,
}

/// Generates drafts for every eligible lead of a campaign.
pub struct DraftService {
    db: Database,
    tools: Arc<ToolRegistry>,
    settings: Settings,
    executor: Option<Arc<dyn JsonTaskExecutor>>,
}

impl DraftService {
    pub fn new(db: Database, tools: Arc<ToolRegistry>, settings: Settings) -> Self {
        Self {
            db,
            tools,
            settings,
            executor: None,
        }
    }

    /// Route every model call through `executor` instead of the configured
    /// provider.
    pub fn with_executor(mut self, executor: Arc<dyn JsonTaskExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    fn router(
        &self,
        owner_key: &str,
        owner: Option<&AgentSettings>,
    ) -> Result<Arc<LlmRouter>, PipelineError> {
        let config = resolve_agent_llm_config(owner, &self.settings);
        info!(
            "LLM config for owner {}: provider={} models={:?} research={} rewrite={}",
            owner_key,
            config.provider,
            config.models,
            config.enable_web_research,
            config.enable_llm_rewrite
        );

        let router = match &self.executor {
            Some(executor) => LlmRouter::with_executor(config, executor.clone())?,
            None => LlmRouter::new(config)?,
        };
        Ok(Arc::new(router))
    }

    /// Draft every eligible lead of a campaign.
    ///
    /// A missing campaign, an unsupported channel or an unusable provider
    /// fails the whole run. A failure for one lead is counted in
    /// [`GenerationReport::failed`] and the others carry on.
    pub async fn generate(
        &self,
        campaign_id: i64,
        options: GenerateOptions,
    ) -> Result<GenerationReport, PipelineError> {
        let pool = self.db.pool();

        let campaign = campaign::get_campaign(pool, campaign_id).await?;
        let brief = Arc::new(CampaignBrief::try_from(&campaign)?);

        let owner_key = options
            .owner_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .unwrap_or(DEFAULT_OWNER_KEY)
            .to_string();
        let owner_settings = agent_settings::get_agent_settings(pool, &owner_key).await?;
        let router = self.router(&owner_key, owner_settings.as_ref())?;

        let pipeline = Arc::new(
            DraftPipeline::new(
                router,
                self.tools.clone(),
                Arc::new(self.db.clone()),
                TemplateSelector::new(self.settings.template_dir.clone()),
            )
            .with_identity(&self.settings.sender_name, &self.settings.product_name),
        );

        let leads =
            lead::list_leads_for_drafting(pool, options.limit, brief.channel.as_str()).await?;
        let workers = options.workers.unwrap_or(self.settings.draft_workers).max(1);
        info!(
            "Generating drafts for campaign {} ({}): {} leads, {} workers",
            campaign_id,
            brief.channel.as_str(),
            leads.len(),
            workers
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        let mut report = GenerationReport::default();
        let total = leads.len();

        for (index, lead) in leads.into_iter().enumerate() {
            if deadline_passed(options.deadline) {
                report.skipped = total - index;
                break;
            }

            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };

            // The wait for a free worker may have outlasted the deadline.
            if deadline_passed(options.deadline) {
                report.skipped = total - index;
                break;
            }

            let db = self.db.clone();
            let pipeline = pipeline.clone();
            let brief = brief.clone();
            let owner_key = owner_key.clone();

            tasks.spawn(async move {
                let lead_id = lead.id;
                let result = draft_lead(&db, &pipeline, &brief, &lead, &owner_key).await;
                drop(permit);
                (lead_id, result)
            });
        }

        if report.skipped > 0 {
            warn!(
                "Deadline reached for campaign {}; {} leads not started",
                campaign_id, report.skipped
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(LeadOutcome::Created))) => report.created += 1,
                Ok((_, Ok(LeadOutcome::Ignored))) => report.ignored += 1,
                Ok((lead_id, Err(e))) => {
                    error!("Draft generation failed for lead {}: {}", lead_id, e);
                    report.failed += 1;
                }
                Err(e) => {
                    error!("Draft task panicked: {}", e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Campaign {} done: created={} ignored={} failed={} skipped={}",
            campaign_id, report.created, report.ignored, report.failed, report.skipped
        );
        Ok(report)
    }
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

async fn draft_lead(
    db: &Database,
    pipeline: &DraftPipeline,
    brief: &CampaignBrief,
    lead: &Lead,
    owner_key: &str,
) -> Result<LeadOutcome, PipelineError> {
    let output = pipeline.run(lead, brief, owner_key).await?;
    let pool = db.pool();

    let created =
        draft::create_draft_if_absent(pool, brief.id, lead.id, &output.subject, &output.body)
            .await?;
    if !created {
        return Ok(LeadOutcome::Ignored);
    }

    let draft_id = draft::find_draft_id(pool, brief.id, lead.id).await?;
    if let Err(e) =
        event::log_event(pool, "draft_created", &created_event(brief.id, &output), draft_id).await
    {
        warn!("Failed to log draft_created for lead {}: {}", lead.id, e);
    }

    if !output.memory_ids.is_empty() {
        if let Err(e) = outreach_memory::mark_used(pool, &output.memory_ids).await {
            warn!("Failed to mark memory used for lead {}: {}", lead.id, e);
        }
    }

    if output.supervision.seeds_memory() {
        let candidate = build_memory_seed(
            &output.context.seed_context(),
            &output.subject,
            &output.body,
            output.supervision.score,
            SUPERVISED_SOURCE_EVENT,
        );
        match outreach_memory::add_memory(pool, &candidate).await {
            Ok(id) => info!("Captured memory {} from lead {}", id, lead.id),
            Err(e) => warn!("Failed to capture memory for lead {}: {}", lead.id, e),
        }
    }

    Ok(LeadOutcome::Created)
}

fn created_event(campaign_id: i64, output: &PipelineOutput) -> serde_json::Value {
    json!({
        "campaign_id": campaign_id,
        "lead_id": output.lead_id,
        "template_source": output.template_source,
        "rewrite_status": output.rewrite_status,
        "reflection_mode": output.reflection.mode,
        "reflection_confidence": output.reflection.confidence,
        "supervisor_status": output.supervision.status,
        "supervisor_score": output.supervision.score,
        "has_research_snippet": !output.context.research_snippet.is_empty(),
        "has_web_result": output.has_research_result,
    })
}
