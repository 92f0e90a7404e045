//! Audit event log.

use serde_json::Value;
use sqlx::SqlitePool;

use crate::models::Event;
use crate::Result;

/// Append an event and return its ID.
pub async fn log_event(
    pool: &SqlitePool,
    event_type: &str,
    payload: &Value,
    draft_id: Option<i64>,
) -> Result<i64> {
    let payload = serde_json::to_string(payload)?;
    let result = sqlx::query(
        r#"
        INSERT INTO events (draft_id, event_type, payload)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(draft_id)
    .bind(event_type)
    .bind(payload)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Events recorded for a draft, oldest first.
pub async fn list_events_for_draft(pool: &SqlitePool, draft_id: i64) -> Result<Vec<Event>> {
    let events = sqlx::query_as::<_, Event>(
        r#"
        SELECT id, draft_id, event_type, payload, created_at
        FROM events
        WHERE draft_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(draft_id)
    .fetch_all(pool)
    .await?;

    Ok(events)
}

/// Count events of one type.
pub async fn count_events(pool: &SqlitePool, event_type: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM events WHERE event_type = ?
        "#,
    )
    .bind(event_type)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
