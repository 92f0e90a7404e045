//! Lead operations.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{map_unique, DatabaseError, Result};
use crate::models::{Lead, NewLead};

/// Domain used for placeholder emails on leads that only have a phone.
pub const NO_EMAIL_DOMAIN: &str = "@no-email.invalid";

const LEAD_COLUMNS: &str = "id, full_name, first_name, last_name, email, phone, specialty, city, \
                            address, source_hash, created_at";

/// Insert a lead and return its ID.
pub async fn insert_lead(pool: &SqlitePool, lead: &NewLead) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO leads (full_name, first_name, last_name, email, phone, specialty, city, address, source_hash)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&lead.full_name)
    .bind(&lead.first_name)
    .bind(&lead.last_name)
    .bind(&lead.email)
    .bind(&lead.phone)
    .bind(&lead.specialty)
    .bind(&lead.city)
    .bind(&lead.address)
    .bind(&lead.source_hash)
    .execute(pool)
    .await
    .map_err(|e| map_unique(e, "Lead", &lead.email))?;

    Ok(result.last_insert_rowid())
}

/// Insert many leads, skipping duplicates. Returns `(inserted, skipped)`.
pub async fn insert_leads(pool: &SqlitePool, leads: &[NewLead]) -> Result<(usize, usize)> {
    let mut inserted = 0;
    let mut skipped = 0;
    for lead in leads {
        match insert_lead(pool, lead).await {
            Ok(_) => inserted += 1,
            Err(DatabaseError::AlreadyExists { id, .. }) => {
                debug!("Skipping duplicate lead {}", id);
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok((inserted, skipped))
}

/// Get a lead by ID.
pub async fn get_lead(pool: &SqlitePool, id: i64) -> Result<Lead> {
    sqlx::query_as::<_, Lead>(&format!("SELECT {} FROM leads WHERE id = ?", LEAD_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Lead",
            id: id.to_string(),
        })
}

/// Leads reachable on a channel, oldest first.
///
/// WhatsApp needs a non-blank phone; every other channel needs a real email
/// (not a placeholder on the `no-email.invalid` domain).
pub async fn list_leads_for_drafting(
    pool: &SqlitePool,
    limit: i64,
    channel: &str,
) -> Result<Vec<Lead>> {
    let filter = if channel.trim().eq_ignore_ascii_case("whatsapp") {
        "phone IS NOT NULL AND trim(phone) != ''".to_string()
    } else {
        format!(
            "email IS NOT NULL AND lower(email) NOT LIKE '%{}'",
            NO_EMAIL_DOMAIN
        )
    };

    let leads = sqlx::query_as::<_, Lead>(&format!(
        "SELECT {} FROM leads WHERE {} ORDER BY id ASC LIMIT ?",
        LEAD_COLUMNS, filter
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(leads)
}

/// Count total leads.
pub async fn count_leads(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM leads
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
