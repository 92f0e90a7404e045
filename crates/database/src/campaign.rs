//! Campaign operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Campaign, NewCampaign};

/// Create a campaign and return its ID.
///
/// The channel is stored lower-cased; it is validated when drafts are
/// generated, not here.
pub async fn create_campaign(pool: &SqlitePool, campaign: &NewCampaign) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO campaigns (name, purpose, channel, subject_template, body_template)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&campaign.name)
    .bind(&campaign.purpose)
    .bind(campaign.channel.trim().to_lowercase())
    .bind(&campaign.subject_template)
    .bind(&campaign.body_template)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Get a campaign by ID.
pub async fn get_campaign(pool: &SqlitePool, id: i64) -> Result<Campaign> {
    sqlx::query_as::<_, Campaign>(
        r#"
        SELECT id, name, purpose, channel, subject_template, body_template, status, created_at
        FROM campaigns
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Campaign",
        id: id.to_string(),
    })
}

/// List all campaigns, newest first.
pub async fn list_campaigns(pool: &SqlitePool) -> Result<Vec<Campaign>> {
    let campaigns = sqlx::query_as::<_, Campaign>(
        r#"
        SELECT id, name, purpose, channel, subject_template, body_template, status, created_at
        FROM campaigns
        ORDER BY id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(campaigns)
}
