//! Human approval workflow: approve with a send time, or reject.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use outreach_database::{draft, Database, DraftStatus};
use tracing::info;

use crate::error::PipelineError;

/// Canonical stored form of a timestamp: RFC 3339 UTC with whole seconds.
///
/// Scheduled and due times are compared as strings, so both sides must use
/// this format.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an operator-supplied send time.
///
/// Blank means now. Offsets are converted to UTC; a time without an offset
/// (or a bare date) is taken as UTC.
pub fn parse_schedule(value: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, PipelineError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(now);
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(PipelineError::InvalidSchedule {
        value: value.to_string(),
        reason: "expected RFC 3339 or YYYY-MM-DD[ HH:MM[:SS]]".to_string(),
    })
}

/// An operator's yes/no on a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Read a free-form answer; anything unrecognized is no decision.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "yes" | "y" | "1" | "true" | "approved" => Some(Decision::Approve),
            "no" | "n" | "0" | "false" | "rejected" => Some(Decision::Reject),
            _ => None,
        }
    }
}

pub struct ApprovalService {
    db: Database,
}

impl ApprovalService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Approve a draft and schedule it. Returns the stored send time.
    pub async fn approve(&self, draft_id: i64, scheduled_at: &str) -> Result<String, PipelineError> {
        let pool = self.db.pool();
        let draft = draft::get_draft(pool, draft_id).await?;
        if matches!(draft.status, DraftStatus::Sent) {
            return Err(PipelineError::DraftState {
                id: draft_id,
                status: draft.status,
                expected: DraftStatus::Draft,
            });
        }

        let at = format_timestamp(parse_schedule(scheduled_at, Utc::now())?);
        draft::approve_and_schedule(pool, draft_id, &at).await?;
        info!("Draft {} approved for {}", draft_id, at);
        Ok(at)
    }

    pub async fn reject(&self, draft_id: i64) -> Result<(), PipelineError> {
        draft::reject_draft(self.db.pool(), draft_id).await?;
        info!("Draft {} rejected", draft_id);
        Ok(())
    }

    /// Apply a free-form decision. Returns `None` when the answer is not
    /// recognized and nothing was changed.
    pub async fn apply(
        &self,
        draft_id: i64,
        answer: &str,
        scheduled_at: &str,
    ) -> Result<Option<Decision>, PipelineError> {
        let decision = Decision::parse(answer);
        match decision {
            Some(Decision::Approve) => {
                self.approve(draft_id, scheduled_at).await?;
            }
            Some(Decision::Reject) => self.reject(draft_id).await?,
            None => {}
        }
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_blank_means_now() {
        assert_eq!(parse_schedule("  ", now()).unwrap(), now());
    }

    #[test]
    fn test_offset_converted_to_utc() {
        let at = parse_schedule("2026-03-02T10:00:00+01:00", now()).unwrap();
        assert_eq!(format_timestamp(at), "2026-03-02T09:00:00Z");
    }

    #[test]
    fn test_naive_times_are_utc() {
        let at = parse_schedule("2026-03-02 10:00", now()).unwrap();
        assert_eq!(format_timestamp(at), "2026-03-02T10:00:00Z");

        let date = parse_schedule("2026-03-02", now()).unwrap();
        assert_eq!(format_timestamp(date), "2026-03-02T00:00:00Z");
    }

    #[test]
    fn test_garbage_rejected() {
        let err = parse_schedule("next tuesday", now()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidSchedule { .. }));
    }

    #[test]
    fn test_decision_parsing() {
        assert_eq!(Decision::parse(" YES "), Some(Decision::Approve));
        assert_eq!(Decision::parse("rejected"), Some(Decision::Reject));
        assert_eq!(Decision::parse("maybe"), None);
    }
}
