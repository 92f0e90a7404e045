//! Draft lifecycle operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Draft, DraftDelivery, DraftStatus};

/// Maximum stored length of a delivery error.
pub const MAX_ERROR_CHARS: usize = 1000;

const DELIVERY_SELECT: &str = r#"
    SELECT d.id AS draft_id, d.campaign_id, d.lead_id, d.subject, d.body, d.status,
           d.scheduled_at, l.email, l.phone, l.specialty, c.channel, c.purpose
    FROM drafts d
    JOIN leads l ON l.id = d.lead_id
    JOIN campaigns c ON c.id = d.campaign_id
"#;

fn not_found(id: i64) -> DatabaseError {
    DatabaseError::NotFound {
        entity: "Draft",
        id: id.to_string(),
    }
}

fn ensure_updated(rows: u64, id: i64) -> Result<()> {
    if rows == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Insert a draft unless one already exists for the (campaign, lead) pair.
///
/// Returns `true` when a row was created.
pub async fn create_draft_if_absent(
    pool: &SqlitePool,
    campaign_id: i64,
    lead_id: i64,
    subject: &str,
    body: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO drafts (campaign_id, lead_id, subject, body, status)
        VALUES (?, ?, ?, ?, 'draft')
        "#,
    )
    .bind(campaign_id)
    .bind(lead_id)
    .bind(subject)
    .bind(body)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Get a draft by ID.
pub async fn get_draft(pool: &SqlitePool, id: i64) -> Result<Draft> {
    sqlx::query_as::<_, Draft>(
        r#"
        SELECT id, campaign_id, lead_id, subject, body, status, scheduled_at,
               approved_at, sent_at, error_message, created_at
        FROM drafts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(id))
}

/// Get the ID of the draft for a (campaign, lead) pair, if any.
pub async fn find_draft_id(pool: &SqlitePool, campaign_id: i64, lead_id: i64) -> Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id FROM drafts WHERE campaign_id = ? AND lead_id = ?
        "#,
    )
    .bind(campaign_id)
    .bind(lead_id)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// List the drafts of a campaign in creation order.
pub async fn list_drafts_for_campaign(pool: &SqlitePool, campaign_id: i64) -> Result<Vec<Draft>> {
    let drafts = sqlx::query_as::<_, Draft>(
        r#"
        SELECT id, campaign_id, lead_id, subject, body, status, scheduled_at,
               approved_at, sent_at, error_message, created_at
        FROM drafts
        WHERE campaign_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;

    Ok(drafts)
}

/// Replace the subject and body of a draft.
pub async fn update_draft_content(pool: &SqlitePool, id: i64, subject: &str, body: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE drafts
        SET subject = ?, body = ?
        WHERE id = ?
        "#,
    )
    .bind(subject)
    .bind(body)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_updated(result.rows_affected(), id)
}

/// Approve a draft and schedule it for delivery.
pub async fn approve_and_schedule(pool: &SqlitePool, id: i64, scheduled_at: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE drafts
        SET status = ?, approved_at = CURRENT_TIMESTAMP, scheduled_at = ?
        WHERE id = ?
        "#,
    )
    .bind(DraftStatus::Approved)
    .bind(scheduled_at)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_updated(result.rows_affected(), id)
}

/// Reject a draft.
pub async fn reject_draft(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE drafts SET status = ? WHERE id = ?
        "#,
    )
    .bind(DraftStatus::Rejected)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_updated(result.rows_affected(), id)
}

/// Approved drafts scheduled at or before `now`, earliest first.
///
/// `now` must use the same timestamp format as the scheduled times.
pub async fn list_due_drafts(
    pool: &SqlitePool,
    now: &str,
    campaign_id: Option<i64>,
) -> Result<Vec<DraftDelivery>> {
    let campaign_filter = if campaign_id.is_some() {
        "AND d.campaign_id = ?"
    } else {
        ""
    };
    let sql = format!(
        "{} WHERE d.status = 'approved' AND d.scheduled_at IS NOT NULL AND d.scheduled_at <= ? {} \
         ORDER BY d.scheduled_at ASC",
        DELIVERY_SELECT, campaign_filter
    );

    let mut query = sqlx::query_as::<_, DraftDelivery>(&sql).bind(now);
    if let Some(campaign_id) = campaign_id {
        query = query.bind(campaign_id);
    }

    Ok(query.fetch_all(pool).await?)
}

/// Get a draft together with its lead and campaign delivery fields.
pub async fn get_delivery(pool: &SqlitePool, id: i64) -> Result<DraftDelivery> {
    sqlx::query_as::<_, DraftDelivery>(&format!("{} WHERE d.id = ?", DELIVERY_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Mark a draft as sent and clear any previous error.
pub async fn mark_sent(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE drafts
        SET status = ?, sent_at = CURRENT_TIMESTAMP, error_message = NULL
        WHERE id = ?
        "#,
    )
    .bind(DraftStatus::Sent)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_updated(result.rows_affected(), id)
}

/// Mark a draft as failed, keeping the first [`MAX_ERROR_CHARS`] of the error.
pub async fn mark_failed(pool: &SqlitePool, id: i64, error: &str) -> Result<()> {
    let error: String = error.chars().take(MAX_ERROR_CHARS).collect();
    let result = sqlx::query(
        r#"
        UPDATE drafts
        SET status = ?, error_message = ?
        WHERE id = ?
        "#,
    )
    .bind(DraftStatus::Failed)
    .bind(error)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_updated(result.rows_affected(), id)
}
