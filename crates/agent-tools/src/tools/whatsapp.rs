//! WhatsApp tool. Only dry runs are supported.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolResult};

const NOT_CONFIGURED: &str =
    "WhatsApp real sending is not configured yet. Use dry-run for WhatsApp campaigns.";

/// Sends a WhatsApp message.
///
/// # Parameters
///
/// - `to`, `body` (required)
/// - `dry_run` (optional, default `true`)
///
/// No live transport exists; a live send returns a failed result.
#[derive(Debug, Default)]
pub struct WhatsApp;

impl WhatsApp {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for WhatsApp {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn description(&self) -> &str {
        "Sends a WhatsApp message. Dry run only."
    }

    async fn run(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        let (Some(to), Some(body)) = (args.get_string_opt("to"), args.get_string_opt("body"))
        else {
            return Err(ToolError::MissingParameter("to/body".to_string()));
        };
        let dry_run = args.get_bool_or("dry_run", true);

        if !dry_run {
            return Ok(ToolResult::failure(
                self.name(),
                json!({"to": to, "dry_run": false}),
                NOT_CONFIGURED,
            ));
        }

        info!(to = %to, "WHATSAPP (dry run)\n{}", body);
        Ok(ToolResult::success(
            self.name(),
            json!({"to": to, "dry_run": true}),
        ))
    }
}
