//! SQLite persistence layer for the cold outreach drafter.
//!
//! This crate provides async database operations for leads, campaigns,
//! drafts, audit events, per-owner agent settings and outreach memory using
//! SQLx with SQLite. [`Database`] also implements
//! [`MemoryStore`](outreach_core::MemoryStore) so the pipeline and the
//! memory tool can read and write patterns without knowing about SQL.
//!
//! # Example
//!
//! ```no_run
//! use database::{campaign, Database, NewCampaign};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:outreach.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let campaign_id = campaign::create_campaign(
//!         db.pool(),
//!         &NewCampaign {
//!             name: "Spring intro".to_string(),
//!             purpose: Some("lead generation".to_string()),
//!             channel: "email".to_string(),
//!             subject_template: "Hello {{ first_name }}".to_string(),
//!             body_template: "Hi {{ full_name }},".to_string(),
//!         },
//!     )
//!     .await?;
//!     println!("created campaign {}", campaign_id);
//!
//!     Ok(())
//! }
//! ```

pub mod agent_settings;
pub mod campaign;
pub mod draft;
pub mod error;
pub mod event;
pub mod lead;
pub mod models;
pub mod outreach_memory;

pub use error::{DatabaseError, Result};
pub use models::{
    Campaign, Draft, DraftDelivery, DraftStatus, Event, Lead, NewCampaign, NewLead,
};

use async_trait::async_trait;
use outreach_core::{MemoryCandidate, MemoryEntry, MemoryError, MemoryQuery, MemoryStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Large enough for the concurrent draft workers plus dispatch.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/outreach.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing; use a single connection)
    /// let db = database::Database::connect_with_pool_size("sqlite::memory:", 1).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn store_error(e: DatabaseError) -> MemoryError {
    MemoryError::Store(e.to_string())
}

#[async_trait]
impl MemoryStore for Database {
    async fn list_for_context(&self, query: &MemoryQuery) -> std::result::Result<Vec<MemoryEntry>, MemoryError> {
        outreach_memory::list_for_context(&self.pool, query)
            .await
            .map_err(store_error)
    }

    async fn add_memory(&self, candidate: &MemoryCandidate) -> std::result::Result<i64, MemoryError> {
        outreach_memory::add_memory(&self.pool, candidate)
            .await
            .map_err(store_error)
    }

    async fn mark_used(&self, ids: &[i64]) -> std::result::Result<(), MemoryError> {
        outreach_memory::mark_used(&self.pool, ids)
            .await
            .map_err(store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_core::AgentSettings;
    use serde_json::json;

    async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn new_lead(email: &str, phone: Option<&str>) -> NewLead {
        NewLead {
            full_name: Some("Dr. Amine Kaci".to_string()),
            first_name: Some("Amine".to_string()),
            last_name: Some("Kaci".to_string()),
            email: email.to_string(),
            phone: phone.map(str::to_string),
            specialty: Some("Cardiologist".to_string()),
            city: Some("Algiers".to_string()),
            ..NewLead::default()
        }
    }

    async fn seed_campaign(db: &Database) -> i64 {
        campaign::create_campaign(
            db.pool(),
            &NewCampaign {
                name: "Intro".to_string(),
                purpose: Some("lead generation".to_string()),
                channel: "Email".to_string(),
                subject_template: "Hello".to_string(),
                body_template: "Hi".to_string(),
            },
        )
        .await
        .unwrap()
    }

    fn candidate(channel: &str, purpose: &str, specialty: &str, score: f64) -> MemoryCandidate {
        MemoryCandidate {
            owner_key: "global".to_string(),
            channel: channel.to_string(),
            purpose: purpose.to_string(),
            specialty: specialty.to_string(),
            pattern_text: format!("pattern {} {}", purpose, specialty),
            quality_score: score,
            source_event: "draft_supervised".to_string(),
        }
    }

    #[tokio::test]
    async fn test_lead_crud() {
        let db = test_db().await;

        let id = lead::insert_lead(db.pool(), &new_lead("a@example.com", None))
            .await
            .unwrap();
        let fetched = lead::get_lead(db.pool(), id).await.unwrap();
        assert_eq!(fetched.full_name.as_deref(), Some("Dr. Amine Kaci"));

        let duplicate = lead::insert_lead(db.pool(), &new_lead("a@example.com", None)).await;
        assert!(matches!(duplicate, Err(DatabaseError::AlreadyExists { .. })));

        let missing = lead::get_lead(db.pool(), 999).await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_insert_leads_skips_duplicates() {
        let db = test_db().await;

        let leads = vec![
            new_lead("a@example.com", None),
            new_lead("a@example.com", None),
            new_lead("b@example.com", None),
        ];
        let (inserted, skipped) = lead::insert_leads(db.pool(), &leads).await.unwrap();
        assert_eq!((inserted, skipped), (2, 1));
        assert_eq!(lead::count_leads(db.pool()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_leads_for_drafting_by_channel() {
        let db = test_db().await;

        lead::insert_lead(db.pool(), &new_lead("a@example.com", Some("  ")))
            .await
            .unwrap();
        lead::insert_lead(db.pool(), &new_lead("x1@NO-EMAIL.invalid", Some("+213555")))
            .await
            .unwrap();
        lead::insert_lead(db.pool(), &new_lead("c@example.com", Some("+213556")))
            .await
            .unwrap();

        let email = lead::list_leads_for_drafting(db.pool(), 10, "email")
            .await
            .unwrap();
        let emails: Vec<&str> = email.iter().map(|l| l.email.as_str()).collect();
        assert_eq!(emails, vec!["a@example.com", "c@example.com"]);

        let whatsapp = lead::list_leads_for_drafting(db.pool(), 10, "whatsapp")
            .await
            .unwrap();
        let phones: Vec<&str> = whatsapp.iter().filter_map(|l| l.phone.as_deref()).collect();
        assert_eq!(phones, vec!["+213555", "+213556"]);

        let limited = lead::list_leads_for_drafting(db.pool(), 1, "email")
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_campaign_channel_lowercased() {
        let db = test_db().await;

        let id = seed_campaign(&db).await;
        let campaign = campaign::get_campaign(db.pool(), id).await.unwrap();
        assert_eq!(campaign.channel, "email");
        assert_eq!(campaign.status, "active");
        assert_eq!(campaign::list_campaigns(db.pool()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_draft_if_absent() {
        let db = test_db().await;
        let campaign_id = seed_campaign(&db).await;
        let lead_id = lead::insert_lead(db.pool(), &new_lead("a@example.com", None))
            .await
            .unwrap();

        let created = draft::create_draft_if_absent(db.pool(), campaign_id, lead_id, "S1", "B1")
            .await
            .unwrap();
        assert!(created);

        let again = draft::create_draft_if_absent(db.pool(), campaign_id, lead_id, "S2", "B2")
            .await
            .unwrap();
        assert!(!again);

        let drafts = draft::list_drafts_for_campaign(db.pool(), campaign_id)
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].subject, "S1");
        assert_eq!(drafts[0].status, DraftStatus::Draft);
    }

    #[tokio::test]
    async fn test_draft_lifecycle() {
        let db = test_db().await;
        let campaign_id = seed_campaign(&db).await;
        let lead_id = lead::insert_lead(db.pool(), &new_lead("a@example.com", None))
            .await
            .unwrap();
        draft::create_draft_if_absent(db.pool(), campaign_id, lead_id, "S", "B")
            .await
            .unwrap();
        let id = draft::find_draft_id(db.pool(), campaign_id, lead_id)
            .await
            .unwrap()
            .unwrap();

        draft::approve_and_schedule(db.pool(), id, "2026-01-01T09:00:00Z")
            .await
            .unwrap();

        let due = draft::list_due_drafts(db.pool(), "2026-01-01T08:59:59Z", None)
            .await
            .unwrap();
        assert!(due.is_empty());

        let due = draft::list_due_drafts(db.pool(), "2026-01-02T00:00:00Z", Some(campaign_id))
            .await
            .unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].email, "a@example.com");
        assert_eq!(due[0].channel, "email");
        assert_eq!(due[0].purpose.as_deref(), Some("lead generation"));

        let long_error = "x".repeat(1500);
        draft::mark_failed(db.pool(), id, &long_error).await.unwrap();
        let failed = draft::get_draft(db.pool(), id).await.unwrap();
        assert_eq!(failed.status, DraftStatus::Failed);
        assert_eq!(failed.error_message.map(|e| e.len()), Some(1000));

        draft::mark_sent(db.pool(), id).await.unwrap();
        let sent = draft::get_draft(db.pool(), id).await.unwrap();
        assert_eq!(sent.status, DraftStatus::Sent);
        assert!(sent.sent_at.is_some());
        assert!(sent.error_message.is_none());

        let missing = draft::reject_draft(db.pool(), 999).await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_event_log() {
        let db = test_db().await;
        let campaign_id = seed_campaign(&db).await;
        let lead_id = lead::insert_lead(db.pool(), &new_lead("a@example.com", None))
            .await
            .unwrap();
        draft::create_draft_if_absent(db.pool(), campaign_id, lead_id, "S", "B")
            .await
            .unwrap();
        let id = draft::find_draft_id(db.pool(), campaign_id, lead_id)
            .await
            .unwrap()
            .unwrap();

        event::log_event(db.pool(), "draft_created", &json!({"rewrite": "disabled"}), Some(id))
            .await
            .unwrap();

        let events = event::list_events_for_draft(db.pool(), id).await.unwrap();
        assert_eq!(events.len(), 1);
        let payload: serde_json::Value = serde_json::from_str(&events[0].payload).unwrap();
        assert_eq!(payload["rewrite"], "disabled");
        assert_eq!(event::count_events(db.pool(), "draft_created").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_agent_settings_keep_api_key() {
        let db = test_db().await;

        let settings = AgentSettings {
            owner_key: "owner@example.com".to_string(),
            llm_provider: Some("groq".to_string()),
            llm_api_key: Some("sk-first".to_string()),
            llm_models: vec!["llama-3.1-8b-instant".to_string()],
            enable_llm_rewrite: Some(true),
            ..AgentSettings::default()
        };
        agent_settings::upsert_agent_settings(db.pool(), &settings)
            .await
            .unwrap();

        let update = AgentSettings {
            llm_api_key: None,
            llm_models: vec![],
            ..settings.clone()
        };
        agent_settings::upsert_agent_settings(db.pool(), &update)
            .await
            .unwrap();

        let stored = agent_settings::get_agent_settings(db.pool(), "owner@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.llm_api_key.as_deref(), Some("sk-first"));
        assert!(stored.llm_models.is_empty());
        assert_eq!(stored.enable_llm_rewrite, Some(true));
        assert_eq!(stored.enable_web_research, None);

        let missing = agent_settings::get_agent_settings(db.pool(), "nobody")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_memory_ranking_and_wildcards() {
        let db = test_db().await;

        let low = db
            .add_memory(&candidate("email", "lead generation", "cardio", 0.7))
            .await
            .unwrap();
        let high = db
            .add_memory(&candidate("email", "", "", 0.9))
            .await
            .unwrap();
        let other_purpose = db
            .add_memory(&candidate("email", "partnership", "cardio", 0.95))
            .await
            .unwrap();
        db.add_memory(&candidate("whatsapp", "", "", 1.0))
            .await
            .unwrap();

        let query = MemoryQuery::new("global", "email", "lead generation", "cardio", 5);
        let ids: Vec<i64> = db
            .list_for_context(&query)
            .await
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![high, low]);

        let any = MemoryQuery::new("global", "email", "", "", 5);
        let ids: Vec<i64> = db
            .list_for_context(&any)
            .await
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![other_purpose, high, low]);
    }

    #[tokio::test]
    async fn test_memory_usage_breaks_ties() {
        let db = test_db().await;

        let first = db
            .add_memory(&candidate("email", "", "", 0.8))
            .await
            .unwrap();
        let second = db
            .add_memory(&candidate("email", "", "", 0.8))
            .await
            .unwrap();

        let query = MemoryQuery::new("global", "email", "", "", 5);
        let ids: Vec<i64> = db
            .list_for_context(&query)
            .await
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![second, first]);

        db.mark_used(&[first]).await.unwrap();
        db.mark_used(&[]).await.unwrap();

        let entries = db.list_for_context(&query).await.unwrap();
        assert_eq!(entries[0].id, first);
        assert_eq!(entries[0].usage_count, 1);
        assert!(entries[0].last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_memory_clamps_and_truncates() {
        let db = test_db().await;

        let mut long = candidate("email", "", "", 1.7);
        long.pattern_text = "p".repeat(900);
        db.add_memory(&long).await.unwrap();

        let entries = outreach_memory::list_by_owner(db.pool(), "global", 0, None)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].pattern_text.chars().count(), 600);
        assert_eq!(entries[0].quality_score, 1.0);
    }

    #[tokio::test]
    async fn test_clear_memory_by_owner() {
        let db = test_db().await;

        db.add_memory(&candidate("email", "", "", 0.8)).await.unwrap();
        db.add_memory(&candidate("whatsapp", "", "", 0.8))
            .await
            .unwrap();

        let cleared = outreach_memory::clear_by_owner(db.pool(), "global", Some(" WhatsApp "))
            .await
            .unwrap();
        assert_eq!(cleared, 1);

        let remaining = outreach_memory::list_by_owner(db.pool(), "global", 20, None)
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].channel, "email");

        let cleared = outreach_memory::clear_by_owner(db.pool(), "global", None)
            .await
            .unwrap();
        assert_eq!(cleared, 1);
    }
}
