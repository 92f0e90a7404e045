//! Error types for pipeline operations.

use agent_tools::ToolError;
use llm_router::LlmError;
use outreach_core::CoreError;
use outreach_database::{DatabaseError, DraftStatus};
use thiserror::Error;

/// Errors that stop a campaign, a single lead or a dispatch.
///
/// Model failures, quality-gate rejections and tool blocks are absorbed by
/// the stages and never show up here; everything below is a configuration
/// or storage defect the operator has to fix.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Storage failure or missing record.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Unsupported campaign channel or unreadable setting.
    #[error("configuration error: {0}")]
    Config(#[from] CoreError),

    /// LLM router could not be built (e.g. unsupported provider).
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    /// Tool registry could not be built.
    #[error("tool error: {0}")]
    Tool(#[from] ToolError),

    /// Template failed to parse or referenced an undefined variable.
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    /// Template file could not be read.
    #[error("template file error: {0}")]
    TemplateFile(#[from] std::io::Error),

    /// A scheduled time that is not a valid timestamp.
    #[error("invalid schedule time {value:?}: {reason}")]
    InvalidSchedule { value: String, reason: String },

    /// Draft is not in a state that allows the operation.
    #[error("draft {id} is {status}, expected {expected}")]
    DraftState {
        id: i64,
        status: DraftStatus,
        expected: DraftStatus,
    },
}
