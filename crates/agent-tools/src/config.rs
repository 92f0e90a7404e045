//! Transport configuration for the live messaging tools.

use std::env;

use secrecy::{ExposeSecret, SecretString};

use crate::error::ToolError;

/// Default SMTP submission port.
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP settings for the email tool.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    password: SecretString,
    /// Sender address.
    pub from: String,
    /// Upgrade the connection with STARTTLS.
    pub starttls: bool,
}

impl SmtpConfig {
    /// Create a new configuration with explicit values.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SMTP_PORT,
            username: username.into(),
            password: SecretString::from(password.into()),
            from: from.into(),
            starttls: true,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Returns `Ok(None)` unless host, user, password and sender are all set:
    /// - `COLD_OUTREACH_SMTP_HOST`
    /// - `COLD_OUTREACH_SMTP_USER`
    /// - `COLD_OUTREACH_SMTP_PASSWORD`
    /// - `COLD_OUTREACH_SMTP_FROM`
    ///
    /// Optional:
    /// - `COLD_OUTREACH_SMTP_PORT` - Default: 587
    /// - `COLD_OUTREACH_SMTP_STARTTLS` - Default: true
    pub fn from_env() -> Result<Option<Self>, ToolError> {
        let (Some(host), Some(username), Some(password), Some(from)) = (
            env_value("COLD_OUTREACH_SMTP_HOST"),
            env_value("COLD_OUTREACH_SMTP_USER"),
            env_value("COLD_OUTREACH_SMTP_PASSWORD"),
            env_value("COLD_OUTREACH_SMTP_FROM"),
        ) else {
            return Ok(None);
        };

        let port = match env_value("COLD_OUTREACH_SMTP_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| {
                ToolError::Configuration(format!("Invalid COLD_OUTREACH_SMTP_PORT: {}", e))
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        let starttls = env_value("COLD_OUTREACH_SMTP_STARTTLS")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(true);

        Ok(Some(
            Self::new(host, username, password, from)
                .with_port(port)
                .with_starttls(starttls),
        ))
    }

    /// Get the password (exposes the secret).
    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Builder method to set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder method to toggle STARTTLS.
    pub fn with_starttls(mut self, starttls: bool) -> Self {
        self.starttls = starttls;
        self
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Default)]
pub struct TelegramConfig {
    bot_token: Option<SecretString>,
    /// Chat used when a call does not name one.
    pub default_chat_id: Option<String>,
}

impl TelegramConfig {
    /// Create a new configuration.
    pub fn new(bot_token: Option<String>, default_chat_id: Option<String>) -> Self {
        Self {
            bot_token: bot_token.map(SecretString::from),
            default_chat_id,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Optional:
    /// - `COLD_OUTREACH_TELEGRAM_BOT_TOKEN`
    /// - `COLD_OUTREACH_TELEGRAM_CHAT_ID`
    pub fn from_env() -> Self {
        Self::new(
            env_value("COLD_OUTREACH_TELEGRAM_BOT_TOKEN"),
            env_value("COLD_OUTREACH_TELEGRAM_CHAT_ID"),
        )
    }

    /// Get the bot token (exposes the secret).
    pub(crate) fn bot_token(&self) -> Option<&str> {
        self.bot_token.as_ref().map(|token| token.expose_secret())
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment-based tests are combined into a single test to avoid
    // race conditions when tests run in parallel (env vars are process-global).
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_vars() {
            for name in [
                "COLD_OUTREACH_SMTP_HOST",
                "COLD_OUTREACH_SMTP_USER",
                "COLD_OUTREACH_SMTP_PASSWORD",
                "COLD_OUTREACH_SMTP_FROM",
                "COLD_OUTREACH_SMTP_PORT",
                "COLD_OUTREACH_SMTP_STARTTLS",
                "COLD_OUTREACH_TELEGRAM_BOT_TOKEN",
                "COLD_OUTREACH_TELEGRAM_CHAT_ID",
            ] {
                std::env::remove_var(name);
            }
        }

        // Scenario 1: incomplete SMTP settings mean no live transport
        clear_vars();
        std::env::set_var("COLD_OUTREACH_SMTP_HOST", "smtp.example.com");
        assert!(SmtpConfig::from_env().unwrap().is_none());

        // Scenario 2: complete settings with defaults
        std::env::set_var("COLD_OUTREACH_SMTP_USER", "user");
        std::env::set_var("COLD_OUTREACH_SMTP_PASSWORD", "secret");
        std::env::set_var("COLD_OUTREACH_SMTP_FROM", "team@example.com");
        let config = SmtpConfig::from_env().unwrap().unwrap();
        assert_eq!(config.port, 587);
        assert!(config.starttls);
        assert_eq!(config.password(), "secret");

        // Scenario 3: bad port is a configuration error
        std::env::set_var("COLD_OUTREACH_SMTP_PORT", "not-a-port");
        assert!(matches!(
            SmtpConfig::from_env(),
            Err(ToolError::Configuration(_))
        ));

        // Scenario 4: telegram
        clear_vars();
        assert!(TelegramConfig::from_env().bot_token().is_none());
        std::env::set_var("COLD_OUTREACH_TELEGRAM_BOT_TOKEN", "123:abc");
        std::env::set_var("COLD_OUTREACH_TELEGRAM_CHAT_ID", "-100");
        let telegram = TelegramConfig::from_env();
        assert_eq!(telegram.bot_token(), Some("123:abc"));
        assert_eq!(telegram.default_chat_id.as_deref(), Some("-100"));

        clear_vars();
    }
}
