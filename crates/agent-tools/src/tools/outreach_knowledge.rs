//! Read-only access to the outreach knowledge base.

use async_trait::async_trait;
use outreach_core::knowledge;
use serde_json::json;

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolResult};

/// Looks up outreach knowledge.
///
/// # Parameters
///
/// - `mode` (optional): `context` (default) or `search`.
/// - context mode: `channel` (default `email`), `purpose`, `specialty`.
/// - search mode: `query` (required), `limit` (default 5).
#[derive(Debug, Default)]
pub struct OutreachKnowledge;

impl OutreachKnowledge {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for OutreachKnowledge {
    fn name(&self) -> &str {
        "outreach_knowledge"
    }

    fn description(&self) -> &str {
        "Returns channel rules, follow-up plans and hooks, or searches them by keyword."
    }

    async fn run(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        let mode = args
            .get_string_opt("mode")
            .map(|m| m.to_lowercase())
            .unwrap_or_else(|| "context".to_string());

        if mode == "search" {
            let query = args.get_string("query")?;
            let limit = args.get_i64_or("limit", 5).max(1) as usize;
            let results = knowledge::search(&query, limit);
            return Ok(ToolResult::success(
                self.name(),
                json!({"mode": "search", "query": query, "results": results}),
            ));
        }

        let channel = args
            .get_string_opt("channel")
            .unwrap_or_else(|| "email".to_string());
        let purpose = args.get_string_opt("purpose").unwrap_or_default();
        let specialty = args.get_string_opt("specialty").unwrap_or_default();

        let context = knowledge::build_context(&channel, &purpose, &specialty);
        Ok(ToolResult::success(
            self.name(),
            json!({"mode": "context", "context": context}),
        ))
    }
}
