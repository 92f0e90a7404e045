//! Outreach memory persistence.

use outreach_core::memory::MAX_PATTERN_CHARS;
use outreach_core::{MemoryCandidate, MemoryEntry, MemoryQuery};
use sqlx::SqlitePool;

use crate::models::MemoryRow;
use crate::Result;

const MEMORY_COLUMNS: &str = "id, owner_key, channel, purpose, specialty, pattern_text, \
                              quality_score, source_event, usage_count, last_used_at, created_at";

/// Entries matching a draft context, best first.
///
/// Channel must match exactly. A purpose or specialty in the query matches
/// entries with the same value or an empty one; `None` matches everything.
pub async fn list_for_context(pool: &SqlitePool, query: &MemoryQuery) -> Result<Vec<MemoryEntry>> {
    let rows = sqlx::query_as::<_, MemoryRow>(&format!(
        r#"
        SELECT {}
        FROM outreach_memory
        WHERE owner_key = ?
          AND channel = ?
          AND (? IS NULL OR purpose = ? OR purpose = '')
          AND (? IS NULL OR specialty = ? OR specialty = '')
        ORDER BY quality_score DESC, usage_count DESC, id DESC
        LIMIT ?
        "#,
        MEMORY_COLUMNS
    ))
    .bind(&query.owner_key)
    .bind(&query.channel)
    .bind(&query.purpose)
    .bind(&query.purpose)
    .bind(&query.specialty)
    .bind(&query.specialty)
    .bind(query.limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(MemoryEntry::from).collect())
}

/// Entries of one owner, optionally restricted to a channel.
///
/// `limit` is clamped to 1..=100.
pub async fn list_by_owner(
    pool: &SqlitePool,
    owner_key: &str,
    limit: i64,
    channel: Option<&str>,
) -> Result<Vec<MemoryEntry>> {
    let limit = limit.clamp(1, 100);
    let channel = channel
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty());

    let rows = sqlx::query_as::<_, MemoryRow>(&format!(
        r#"
        SELECT {}
        FROM outreach_memory
        WHERE owner_key = ?
          AND (? IS NULL OR channel = ?)
        ORDER BY quality_score DESC, usage_count DESC, id DESC
        LIMIT ?
        "#,
        MEMORY_COLUMNS
    ))
    .bind(owner_key)
    .bind(&channel)
    .bind(&channel)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(MemoryEntry::from).collect())
}

/// Store a pattern and return its ID.
///
/// The pattern is truncated to [`MAX_PATTERN_CHARS`] and the score clamped
/// to [0, 1].
pub async fn add_memory(pool: &SqlitePool, candidate: &MemoryCandidate) -> Result<i64> {
    let pattern: String = candidate.pattern_text.chars().take(MAX_PATTERN_CHARS).collect();
    let result = sqlx::query(
        r#"
        INSERT INTO outreach_memory (
            owner_key, channel, purpose, specialty, pattern_text, quality_score, source_event
        )
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&candidate.owner_key)
    .bind(&candidate.channel)
    .bind(&candidate.purpose)
    .bind(&candidate.specialty)
    .bind(pattern)
    .bind(candidate.quality_score.clamp(0.0, 1.0))
    .bind(&candidate.source_event)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Increment usage count and last-used time of each entry.
pub async fn mark_used(pool: &SqlitePool, ids: &[i64]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for id in ids {
        sqlx::query(
            r#"
            UPDATE outreach_memory
            SET usage_count = usage_count + 1,
                last_used_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(())
}

/// Delete an owner's entries, optionally only one channel. Returns the count.
pub async fn clear_by_owner(pool: &SqlitePool, owner_key: &str, channel: Option<&str>) -> Result<u64> {
    let channel = channel
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty());

    let result = sqlx::query(
        r#"
        DELETE FROM outreach_memory
        WHERE owner_key = ?
          AND (? IS NULL OR channel = ?)
        "#,
    )
    .bind(owner_key)
    .bind(&channel)
    .bind(&channel)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
