//! Outreach memory: reusable style patterns learned from good drafts.
//!
//! A pattern is a compact fingerprint of a draft (subject style, opener and
//! call to action). Patterns are captured when a draft clears supervision or
//! is actually sent, and are fed back as few-shot context for later drafts
//! with the same owner, channel, purpose and specialty.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::truncate_chars;

/// Maximum characters stored for a pattern.
pub const MAX_PATTERN_CHARS: usize = 600;

const MAX_OPENER_CHARS: usize = 180;
const MAX_SUBJECT_STYLE_CHARS: usize = 100;

/// A stored memory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: i64,
    pub owner_key: String,
    pub channel: String,
    pub purpose: String,
    pub specialty: String,
    pub pattern_text: String,
    pub quality_score: f64,
    pub source_event: String,
    pub usage_count: i64,
    pub last_used_at: Option<String>,
    pub created_at: String,
}

/// A pattern ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryCandidate {
    pub owner_key: String,
    pub channel: String,
    pub purpose: String,
    pub specialty: String,
    pub pattern_text: String,
    pub quality_score: f64,
    pub source_event: String,
}

/// Where a draft was produced; used to key a new memory entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedContext {
    pub owner_key: String,
    pub channel: String,
    pub purpose: String,
    pub specialty: String,
}

/// Lookup parameters for [`MemoryStore::list_for_context`].
///
/// `None` (or an empty string) for purpose or specialty matches every entry;
/// a value matches entries with the same value or an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryQuery {
    pub owner_key: String,
    pub channel: String,
    pub purpose: Option<String>,
    pub specialty: Option<String>,
    pub limit: i64,
}

impl MemoryQuery {
    /// Build a query, treating blank purpose/specialty as wildcards.
    pub fn new(
        owner_key: impl Into<String>,
        channel: impl Into<String>,
        purpose: &str,
        specialty: &str,
        limit: i64,
    ) -> Self {
        let non_blank = |value: &str| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        Self {
            owner_key: owner_key.into(),
            channel: channel.into().trim().to_lowercase(),
            purpose: non_blank(purpose),
            specialty: non_blank(specialty),
            limit,
        }
    }
}

/// Errors returned by memory stores.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Storage or retrieval failure.
    #[error("memory store error: {0}")]
    Store(String),
}

/// A durable store for outreach memory patterns.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Rank matching entries by quality, then usage, then recency.
    async fn list_for_context(&self, query: &MemoryQuery) -> Result<Vec<MemoryEntry>, MemoryError>;

    /// Store a new pattern and return its id.
    async fn add_memory(&self, candidate: &MemoryCandidate) -> Result<i64, MemoryError>;

    /// Bump usage count and last-used time for each id.
    async fn mark_used(&self, ids: &[i64]) -> Result<(), MemoryError>;
}

fn is_cta_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    line.contains('?') || lower.contains("would you") || lower.contains("open to")
}

/// Derive a memory pattern from a finished draft.
pub fn build_memory_seed(
    context: &SeedContext,
    subject: &str,
    body: &str,
    score: f64,
    source_event: &str,
) -> MemoryCandidate {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let opener = truncate_chars(lines.first().copied().unwrap_or(body.trim()), MAX_OPENER_CHARS);

    let tail_start = lines.len().saturating_sub(4);
    let cta = lines[tail_start..]
        .iter()
        .find(|line| is_cta_line(line))
        .map(|line| truncate_chars(line, MAX_OPENER_CHARS));

    let mut parts = vec![
        format!(
            "subject_style={}",
            truncate_chars(subject, MAX_SUBJECT_STYLE_CHARS)
        ),
        format!("opener={}", opener),
    ];
    if let Some(cta) = cta {
        parts.push(format!("cta={}", cta));
    }

    let owner_key = context.owner_key.trim();
    let channel = context.channel.trim().to_lowercase();

    MemoryCandidate {
        owner_key: if owner_key.is_empty() {
            "global".to_string()
        } else {
            owner_key.to_string()
        },
        channel: if channel.is_empty() {
            "email".to_string()
        } else {
            channel
        },
        purpose: context.purpose.trim().to_string(),
        specialty: context.specialty.trim().to_string(),
        pattern_text: truncate_chars(&parts.join(" | "), MAX_PATTERN_CHARS),
        quality_score: score.clamp(0.0, 1.0),
        source_event: source_event.to_string(),
    }
}

/// Render memory entries as one prompt line each.
pub fn format_memory_for_prompt(memories: &[MemoryEntry]) -> Vec<String> {
    memories
        .iter()
        .filter(|memory| !memory.pattern_text.is_empty())
        .map(|memory| {
            let channel = if memory.channel.is_empty() {
                "email"
            } else {
                memory.channel.as_str()
            };
            let specialty = if memory.specialty.is_empty() {
                "general"
            } else {
                memory.specialty.as_str()
            };
            format!(
                "[{} | {} | score={:.2}] {}",
                channel, specialty, memory.quality_score, memory.pattern_text
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_context() -> SeedContext {
        SeedContext {
            owner_key: "owner-1".to_string(),
            channel: "Email".to_string(),
            purpose: "lead generation".to_string(),
            specialty: "Cardiologist".to_string(),
        }
    }

    fn entry(pattern: &str, specialty: &str, score: f64) -> MemoryEntry {
        MemoryEntry {
            id: 1,
            owner_key: "global".to_string(),
            channel: "email".to_string(),
            purpose: String::new(),
            specialty: specialty.to_string(),
            pattern_text: pattern.to_string(),
            quality_score: score,
            source_event: "draft_supervised".to_string(),
            usage_count: 0,
            last_used_at: None,
            created_at: "2026-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_seed_extracts_opener_and_cta() {
        let body = "\n  Hello Dr. Kaci,  \n\nWe help cardiology clinics.\nMore detail here.\nWould you be open to a call?\nBest,\nSam";
        let seed = build_memory_seed(&seed_context(), "Quick idea", body, 0.9, "draft_supervised");

        assert_eq!(
            seed.pattern_text,
            "subject_style=Quick idea | opener=Hello Dr. Kaci, | cta=Would you be open to a call?"
        );
        assert_eq!(seed.channel, "email");
        assert_eq!(seed.owner_key, "owner-1");
        assert_eq!(seed.source_event, "draft_supervised");
    }

    #[test]
    fn test_seed_cta_only_from_last_four_lines() {
        let body = "Any questions?\nline two\nline three\nline four\nline five";
        let seed = build_memory_seed(&seed_context(), "Subject", body, 0.8, "draft_sent");
        assert!(!seed.pattern_text.contains("cta="));
    }

    #[test]
    fn test_seed_defaults_and_clamps() {
        let seed = build_memory_seed(&SeedContext::default(), "S", "", 1.7, "draft_sent");
        assert_eq!(seed.owner_key, "global");
        assert_eq!(seed.channel, "email");
        assert_eq!(seed.quality_score, 1.0);
        assert_eq!(seed.pattern_text, "subject_style=S | opener=");
    }

    #[test]
    fn test_seed_truncates() {
        let long_line = "x".repeat(400);
        let seed = build_memory_seed(&seed_context(), &"s".repeat(300), &long_line, 0.9, "e");
        assert!(seed.pattern_text.chars().count() <= MAX_PATTERN_CHARS);
        assert!(seed.pattern_text.contains(&format!("opener={}", "x".repeat(180))));
        assert!(seed.pattern_text.starts_with(&format!("subject_style={} |", "s".repeat(100))));
    }

    #[test]
    fn test_format_memory_for_prompt() {
        let memories = vec![
            entry("subject_style=Hi", "", 0.834),
            entry("", "dent", 0.9),
            entry("opener=Hello", "dent", 0.8),
        ];
        let lines = format_memory_for_prompt(&memories);
        assert_eq!(
            lines,
            vec![
                "[email | general | score=0.83] subject_style=Hi".to_string(),
                "[email | dent | score=0.80] opener=Hello".to_string(),
            ]
        );
    }

    #[test]
    fn test_memory_query_wildcards() {
        let query = MemoryQuery::new("global", " EMAIL ", "  ", "dent", 5);
        assert_eq!(query.channel, "email");
        assert!(query.purpose.is_none());
        assert_eq!(query.specialty.as_deref(), Some("dent"));
    }
}
