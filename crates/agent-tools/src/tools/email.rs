//! Email tool: SMTP delivery via lettre, or a logged dry run.

use async_trait::async_trait;
use lettre::{
    transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport, Message,
    Tokio1Executor,
};
use serde_json::json;
use tracing::info;

use crate::config::SmtpConfig;
use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolResult};

/// Sends a plain-text email.
///
/// # Parameters
///
/// - `to`, `subject`, `body` (required)
/// - `dry_run` (optional, default `true`): log instead of sending.
///
/// Without SMTP configuration only dry runs succeed.
pub struct Email {
    transport: Option<(AsyncSmtpTransport<Tokio1Executor>, String)>,
}

impl Email {
    /// Create an email tool. `None` disables live sending.
    pub fn new(config: Option<SmtpConfig>) -> Result<Self, ToolError> {
        let transport = match config {
            Some(config) => Some((build_transport(&config)?, config.from.clone())),
            None => None,
        };
        Ok(Self { transport })
    }

    /// An email tool that can only dry-run.
    pub fn dry_run_only() -> Self {
        Self { transport: None }
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), ToolError> {
        let (transport, from) = self.transport.as_ref().ok_or_else(|| {
            ToolError::Configuration(
                "SMTP settings are incomplete. Set COLD_OUTREACH_SMTP_* environment variables."
                    .to_string(),
            )
        })?;

        let message = Message::builder()
            .from(from.parse().map_err(|e| ToolError::InvalidParameter {
                name: "from".to_string(),
                reason: format!("{}", e),
            })?)
            .to(to.parse().map_err(|e| ToolError::InvalidParameter {
                name: "to".to_string(),
                reason: format!("{}", e),
            })?)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to build email: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to send email: {}", e)))?;

        info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

fn build_transport(config: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, ToolError> {
    let creds = Credentials::new(config.username.clone(), config.password().to_string());

    let builder = if config.starttls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| ToolError::Configuration(format!("SMTP transport error: {}", e)))?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
    };

    info!(
        host = %config.host,
        port = config.port,
        username = %config.username,
        "Created SMTP transport"
    );

    Ok(builder.port(config.port).credentials(creds).build())
}

#[async_trait]
impl Tool for Email {
    fn name(&self) -> &str {
        "email"
    }

    fn description(&self) -> &str {
        "Sends a plain-text email over SMTP. Dry run by default."
    }

    async fn run(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        let (Some(to), Some(subject), Some(body)) = (
            args.get_string_opt("to"),
            args.get_string_opt("subject"),
            args.get_string_opt("body"),
        ) else {
            return Err(ToolError::MissingParameter("to/subject/body".to_string()));
        };
        let dry_run = args.get_bool_or("dry_run", true);

        if dry_run {
            info!(to = %to, subject = %subject, "EMAIL (dry run)\n{}", body);
            return Ok(ToolResult::success(
                self.name(),
                json!({"to": to, "dry_run": true}),
            ));
        }

        match self.send(&to, &subject, &body).await {
            Ok(()) => Ok(ToolResult::success(
                self.name(),
                json!({"to": to, "dry_run": false}),
            )),
            Err(e) => Ok(ToolResult::failure(
                self.name(),
                json!({"to": to, "dry_run": false}),
                e.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn args(payload: Value) -> ToolArgs {
        ToolArgs::from_value(payload)
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let email = Email::dry_run_only();
        let result = email.run(args(json!({"to": "a@b.com", "subject": "Hi"}))).await;
        assert!(matches!(result, Err(ToolError::MissingParameter(ref p)) if p == "to/subject/body"));
    }

    #[tokio::test]
    async fn test_dry_run_by_default() {
        let email = Email::dry_run_only();
        let result = email
            .run(args(json!({"to": "a@b.com", "subject": "Hi", "body": "Hello"})))
            .await
            .unwrap();
        assert!(result.ok);
        assert_eq!(result.data, json!({"to": "a@b.com", "dry_run": true}));
    }

    #[tokio::test]
    async fn test_live_send_without_smtp_fails() {
        let email = Email::dry_run_only();
        let result = email
            .run(args(json!({
                "to": "a@b.com",
                "subject": "Hi",
                "body": "Hello",
                "dry_run": false
            })))
            .await
            .unwrap();
        assert!(!result.ok);
        assert!(result.error.unwrap().contains("SMTP settings are incomplete"));
        assert_eq!(result.data["dry_run"], false);
    }
}
