//! Read-only access to outreach memory.

use std::sync::Arc;

use async_trait::async_trait;
use outreach_core::{MemoryQuery, MemoryStore};
use serde_json::json;

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolResult};

/// Lists the best memory patterns for a context.
///
/// # Parameters
///
/// - `owner_key` (default `global`), `channel` (default `email`)
/// - `purpose`, `specialty` (optional, blank matches all)
/// - `limit` (default 5)
pub struct OutreachMemory {
    store: Arc<dyn MemoryStore>,
}

impl OutreachMemory {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for OutreachMemory {
    fn name(&self) -> &str {
        "outreach_memory"
    }

    fn description(&self) -> &str {
        "Lists stored outreach patterns ranked by quality and usage."
    }

    async fn run(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        let query = MemoryQuery::new(
            args.get_string_opt("owner_key")
                .unwrap_or_else(|| "global".to_string()),
            args.get_string_opt("channel")
                .unwrap_or_else(|| "email".to_string()),
            &args.get_string_opt("purpose").unwrap_or_default(),
            &args.get_string_opt("specialty").unwrap_or_default(),
            args.get_i64_or("limit", 5),
        );

        let items = self
            .store
            .list_for_context(&query)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        Ok(ToolResult::success(
            self.name(),
            json!({"count": items.len(), "items": items}),
        ))
    }
}
