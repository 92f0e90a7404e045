//! Registry behaviour with the built-in tools.

use std::sync::Arc;

use agent_tools::{
    async_trait, LoopDetector, OutreachKnowledge, OutreachMemory, ToolPolicy, ToolRegistry,
    WebSearch, WhatsApp,
};
use outreach_core::{MemoryCandidate, MemoryEntry, MemoryError, MemoryQuery, MemoryStore};
use serde_json::json;
use tokio::sync::Mutex;

/// Memory store that records queries and returns fixed entries.
#[derive(Default)]
struct FixedMemory {
    entries: Vec<MemoryEntry>,
    queries: Mutex<Vec<MemoryQuery>>,
}

#[async_trait]
impl MemoryStore for FixedMemory {
    async fn list_for_context(&self, query: &MemoryQuery) -> Result<Vec<MemoryEntry>, MemoryError> {
        self.queries.lock().await.push(query.clone());
        Ok(self.entries.clone())
    }

    async fn add_memory(&self, _candidate: &MemoryCandidate) -> Result<i64, MemoryError> {
        Err(MemoryError::Store("read only".to_string()))
    }

    async fn mark_used(&self, _ids: &[i64]) -> Result<(), MemoryError> {
        Ok(())
    }
}

fn entry(id: i64) -> MemoryEntry {
    MemoryEntry {
        id,
        owner_key: "global".to_string(),
        channel: "email".to_string(),
        purpose: String::new(),
        specialty: "cardio".to_string(),
        pattern_text: "subject_style=Hi | opener=Hello".to_string(),
        quality_score: 0.9,
        source_event: "draft_sent".to_string(),
        usage_count: 2,
        last_used_at: None,
        created_at: "2026-01-01 00:00:00".to_string(),
    }
}

#[tokio::test]
async fn test_memory_tool_defaults() {
    let store = Arc::new(FixedMemory {
        entries: vec![entry(1), entry(2)],
        ..FixedMemory::default()
    });
    let mut registry = ToolRegistry::new();
    registry.register(OutreachMemory::new(store.clone()));

    let result = registry.run("memory", json!({"specialty": "Cardiology"})).await;
    assert!(result.ok);
    assert_eq!(result.data["count"], 2);
    assert_eq!(result.data["items"][0]["id"], 1);

    let queries = store.queries.lock().await;
    assert_eq!(queries[0].owner_key, "global");
    assert_eq!(queries[0].channel, "email");
    assert_eq!(queries[0].purpose, None);
    assert_eq!(queries[0].specialty.as_deref(), Some("Cardiology"));
    assert_eq!(queries[0].limit, 5);
}

#[tokio::test]
async fn test_minimal_profile_denies_messaging() {
    let mut registry = ToolRegistry::with_policy(
        ToolPolicy::new("minimal"),
        LoopDetector::new(true, 30, 10),
    );
    registry.register(WebSearch::new().unwrap());
    registry.register(WhatsApp::new());

    let result = registry
        .run("whatsapp", json!({"to": "+213555", "body": "Hello"}))
        .await;
    assert!(!result.ok);
    assert_eq!(result.blocked_reason(), Some("policy_denied"));
    assert_eq!(registry.available().await, vec!["web_search"]);
}

#[tokio::test]
async fn test_loop_detection_spans_concurrent_callers() {
    let mut registry = ToolRegistry::with_policy(
        ToolPolicy::new("messaging"),
        LoopDetector::new(true, 30, 4),
    );
    registry.register(OutreachKnowledge::new());
    let registry = Arc::new(registry);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry
                .run("knowledge", json!({"mode": "search", "query": "cadence"}))
                .await
        }));
    }

    let mut blocked = 0;
    for handle in handles {
        let result = handle.await.unwrap();
        if result.blocked_reason() == Some("loop_detected") {
            blocked += 1;
        }
    }
    assert_eq!(blocked, 1);
}

#[tokio::test]
async fn test_disabled_loop_detection() {
    let mut registry = ToolRegistry::with_policy(ToolPolicy::new("messaging"), LoopDetector::disabled());
    registry.register(WhatsApp::new());

    for _ in 0..15 {
        let result = registry
            .run("whatsapp", json!({"to": "+213555", "body": "Hello"}))
            .await;
        assert!(result.ok);
    }
}
