//! Repeated-call loop detection.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use outreach_core::sha256_hex;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// Smallest history window the detector keeps.
pub const MIN_HISTORY_SIZE: usize = 10;

/// Smallest repeat count that can trigger a block.
pub const MIN_CRITICAL_THRESHOLD: usize = 2;

/// One dispatched tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallRecord {
    pub tool: String,
    pub args_hash: String,
    pub timestamp_ms: u128,
}

/// Bounded, oldest-evicted history of tool calls.
///
/// Shared by every caller of one registry, so identical calls coming from
/// different lead pipelines count toward the same threshold.
pub struct LoopDetector {
    enabled: bool,
    capacity: usize,
    critical_threshold: usize,
    history: Mutex<VecDeque<ToolCallRecord>>,
}

impl LoopDetector {
    /// Create a detector. Capacity and threshold are raised to their floors.
    pub fn new(enabled: bool, history_size: usize, critical_threshold: usize) -> Self {
        let capacity = history_size.max(MIN_HISTORY_SIZE);
        Self {
            enabled,
            capacity,
            critical_threshold: critical_threshold.max(MIN_CRITICAL_THRESHOLD),
            history: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// A detector that never blocks.
    pub fn disabled() -> Self {
        Self::new(false, MIN_HISTORY_SIZE, MIN_CRITICAL_THRESHOLD)
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn critical_threshold(&self) -> usize {
        self.critical_threshold
    }

    /// Append a call and return how many retained entries match it.
    pub async fn record(&self, tool: &str, args_hash: &str) -> usize {
        let mut history = self.history.lock().await;
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(ToolCallRecord {
            tool: tool.to_string(),
            args_hash: args_hash.to_string(),
            timestamp_ms: now_ms(),
        });

        history
            .iter()
            .filter(|record| record.tool == tool && record.args_hash == args_hash)
            .count()
    }

    /// Record the call and report whether it must be blocked.
    pub async fn check(&self, tool: &str, payload: &Value) -> bool {
        if !self.enabled {
            return false;
        }
        let count = self.record(tool, &hash_tool_call(tool, payload)).await;
        count >= self.critical_threshold
    }
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Hash a call as `sha256("{tool}:{canonical json}")`.
pub fn hash_tool_call(tool: &str, payload: &Value) -> String {
    let canonical = canonicalize(payload).to_string();
    sha256_hex(&format!("{}:{}", tool, canonical))
}

/// Rebuild objects with sorted keys, recursively.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(object) => {
            let mut keys: Vec<&String> = object.keys().collect();
            keys.sort();

            let mut map = Map::new();
            for key in keys {
                if let Some(inner) = object.get(key) {
                    map.insert(key.clone(), canonicalize(inner));
                }
            }
            Value::Object(map)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_ignores_key_order() {
        let a = hash_tool_call("email", &json!({"to": "a@b.com", "body": {"x": 1, "y": 2}}));
        let b = hash_tool_call("email", &json!({"body": {"y": 2, "x": 1}, "to": "a@b.com"}));
        assert_eq!(a, b);
        assert_ne!(a, hash_tool_call("whatsapp", &json!({"to": "a@b.com", "body": {"x": 1, "y": 2}})));
    }

    #[test]
    fn test_floors() {
        let detector = LoopDetector::new(true, 3, 1);
        assert_eq!(detector.capacity(), 10);
        assert_eq!(detector.critical_threshold(), 2);
    }

    #[tokio::test]
    async fn test_blocks_at_threshold() {
        let detector = LoopDetector::new(true, 30, 3);
        let payload = json!({"query": "x"});

        assert!(!detector.check("web_search", &payload).await);
        assert!(!detector.check("web_search", &payload).await);
        assert!(detector.check("web_search", &payload).await);
    }

    #[tokio::test]
    async fn test_window_eviction() {
        let detector = LoopDetector::new(true, 10, 2);
        let payload = json!({"query": "x"});

        assert!(!detector.check("web_search", &payload).await);
        for i in 0..10 {
            assert!(!detector.check("web_search", &json!({"query": i})).await);
        }
        // The first call has been evicted.
        assert!(!detector.check("web_search", &payload).await);
        assert!(detector.check("web_search", &payload).await);
    }

    #[tokio::test]
    async fn test_disabled_never_blocks() {
        let detector = LoopDetector::disabled();
        let payload = json!({});
        for _ in 0..20 {
            assert!(!detector.check("email", &payload).await);
        }
    }
}
