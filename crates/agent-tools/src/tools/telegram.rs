//! Telegram tool using the Bot API.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::config::TelegramConfig;
use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolResult};

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Sends a Telegram message through `sendMessage`.
///
/// # Parameters
///
/// - `text` or `body` (required)
/// - `chat_id` (optional when a default chat is configured)
/// - `dry_run` (optional, default `true`)
pub struct Telegram {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl Telegram {
    /// Create a new Telegram tool.
    pub fn new(config: TelegramConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }

    async fn send(&self, token: &str, chat_id: &str, text: &str) -> Result<String, ToolError> {
        let url = format!("{}/bot{}/sendMessage", TELEGRAM_API, token);
        debug!("Sending Telegram message to chat {}", chat_id);

        let response = self
            .client
            .post(&url)
            .json(&json!({"chat_id": chat_id, "text": text}))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ToolError::ExecutionFailed(format!(
                "Telegram API returned status {}: {}",
                status, body
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl Tool for Telegram {
    fn name(&self) -> &str {
        "telegram"
    }

    fn description(&self) -> &str {
        "Sends a Telegram message via the Bot API. Dry run by default."
    }

    async fn run(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        let text = args
            .get_string_opt("text")
            .or_else(|| args.get_string_opt("body"))
            .ok_or_else(|| ToolError::MissingParameter("text/body".to_string()))?;
        let chat_id = args
            .get_string_opt("chat_id")
            .or_else(|| self.config.default_chat_id.clone())
            .ok_or_else(|| ToolError::MissingParameter("chat_id".to_string()))?;
        let dry_run = args.get_bool_or("dry_run", true);

        if dry_run {
            info!(chat_id = %chat_id, "TELEGRAM (dry run)\n{}", text);
            return Ok(ToolResult::success(
                self.name(),
                json!({"chat_id": chat_id, "dry_run": true}),
            ));
        }

        let Some(token) = self.config.bot_token() else {
            return Ok(ToolResult::failure(
                self.name(),
                json!({"chat_id": chat_id}),
                "Telegram bot token not configured",
            ));
        };

        match self.send(token, &chat_id, &text).await {
            Ok(response) => Ok(ToolResult::success(
                self.name(),
                json!({"chat_id": chat_id, "response": response}),
            )),
            Err(e) => Ok(ToolResult::failure(
                self.name(),
                json!({"chat_id": chat_id}),
                e.to_string(),
            )),
        }
    }
}
