//! Per-owner agent settings.

use outreach_core::AgentSettings;
use sqlx::SqlitePool;

use crate::models::AgentSettingsRow;
use crate::Result;

/// Get the agent settings for an owner, if any were saved.
pub async fn get_agent_settings(pool: &SqlitePool, owner_key: &str) -> Result<Option<AgentSettings>> {
    let row = sqlx::query_as::<_, AgentSettingsRow>(
        r#"
        SELECT owner_key, llm_provider, llm_base_url, llm_api_key, llm_models_json,
               enable_web_research, enable_llm_rewrite, prompt_search, prompt_routing,
               prompt_supervisor, prompt_rewrite
        FROM agent_settings
        WHERE owner_key = ?
        "#,
    )
    .bind(owner_key)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(AgentSettings::from))
}

/// Create or replace the agent settings for an owner.
///
/// A `None` API key keeps the previously stored key.
pub async fn upsert_agent_settings(pool: &SqlitePool, settings: &AgentSettings) -> Result<()> {
    let models_json = serde_json::to_string(&settings.llm_models)?;

    sqlx::query(
        r#"
        INSERT INTO agent_settings (
            owner_key, llm_provider, llm_base_url, llm_api_key, llm_models_json,
            enable_web_research, enable_llm_rewrite, prompt_search, prompt_routing,
            prompt_supervisor, prompt_rewrite
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(owner_key) DO UPDATE SET
            llm_provider = excluded.llm_provider,
            llm_base_url = excluded.llm_base_url,
            llm_api_key = COALESCE(excluded.llm_api_key, agent_settings.llm_api_key),
            llm_models_json = excluded.llm_models_json,
            enable_web_research = excluded.enable_web_research,
            enable_llm_rewrite = excluded.enable_llm_rewrite,
            prompt_search = excluded.prompt_search,
            prompt_routing = excluded.prompt_routing,
            prompt_supervisor = excluded.prompt_supervisor,
            prompt_rewrite = excluded.prompt_rewrite,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&settings.owner_key)
    .bind(&settings.llm_provider)
    .bind(&settings.llm_base_url)
    .bind(&settings.llm_api_key)
    .bind(models_json)
    .bind(settings.enable_web_research)
    .bind(settings.enable_llm_rewrite)
    .bind(&settings.prompt_search)
    .bind(&settings.prompt_routing)
    .bind(&settings.prompt_supervisor)
    .bind(&settings.prompt_rewrite)
    .execute(pool)
    .await?;

    Ok(())
}
