//! Agent pipeline and campaign drafting for cold outreach.
//!
//! This crate turns leads into reviewed drafts and sends the drafts a human
//! approved. Every model call goes through [`llm_router::LlmRouter`] and
//! every side effect through [`agent_tools::ToolRegistry`].
//!
//! # Features
//!
//! - Runs each lead through research, routing, copywriting, rewrite,
//!   reflection and supervision stages
//! - Falls back to deterministic heuristics whenever a model is disabled,
//!   unreachable or fails a quality gate
//! - Drafts leads concurrently on a bounded worker pool
//! - Feeds well-scored and delivered drafts back into outreach memory
//!
//! # Architecture
//!
//! ```text
//! Lead (database)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      DRAFT PIPELINE                         │
//! │                                                             │
//! │  1. Lead intelligence (hook, source hash)                   │
//! │  2. Research (resource link, web_search tool)               │
//! │  3. Template selection (specialty overrides)                │
//! │  4. Routing (angle + CTA)                                   │
//! │  5. Memory + knowledge base context                         │
//! │  6. Copywriting (tera, undefined variable = error)          │
//! │  7. Rewrite (quality gated)                                 │
//! │  8. Reflection (LLM or heuristic clean-up)                  │
//! │  9. Supervision (score; ≥ 0.78 seeds memory)                │
//! └─────────────────────────────────────────────────────────────┘
//!          ↓
//! Draft (insert if absent) → approval → DispatchService → channel tool
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use orchestrator::{DraftService, GenerateOptions};
//!
//! let settings = outreach_core::Settings::from_env()?;
//! let db = outreach_database::Database::connect("sqlite:outreach.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let tools = agent_tools::default_registry(&settings, Arc::new(db.clone()))?;
//! let service = DraftService::new(db, Arc::new(tools), settings);
//!
//! let report = service.generate(1, GenerateOptions::default()).await?;
//! println!("created {} drafts", report.created);
//! ```

mod approvals;
mod context;
mod dispatch;
mod drafts;
mod error;
mod pipeline;
pub mod stages;
mod templates;

pub use approvals::{format_timestamp, parse_schedule, ApprovalService, Decision};
pub use context::{
    CampaignBrief, DraftContext, LeadProfile, Research, Routing, DEFAULT_OWNER_KEY,
};
pub use dispatch::{DispatchReport, DispatchService, SendOutcome, SENT_MEMORY_SCORE, SENT_SOURCE_EVENT};
pub use drafts::{DraftService, GenerateOptions, GenerationReport, SUPERVISED_SOURCE_EVENT};
pub use error::PipelineError;
pub use pipeline::{DraftPipeline, PipelineOutput, MEMORY_LIMIT};
pub use templates::{specialty_slug, TemplateChoice, TemplateSelector, CAMPAIGN_DEFAULT};

pub use stages::reflection::{heuristic_refine, Reflection, ReflectionMode};
pub use stages::rewrite::RewriteStatus;
pub use stages::supervisor::{Supervision, MEMORY_SEED_THRESHOLD};
