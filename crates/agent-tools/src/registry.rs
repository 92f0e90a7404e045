//! Tool registry: existence, policy and loop gates in front of every tool.

use std::collections::HashMap;
use std::sync::Arc;

use outreach_core::Settings;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::loop_detection::LoopDetector;
use crate::policy::{normalize_tool_name, ToolPolicy};
use crate::tool::{Tool, ToolArgs, ToolResult};

/// Registry for dispatching tool calls.
///
/// Every call passes three gates in order: the tool must exist, the policy
/// must allow it, and the loop detector must not have seen the identical
/// call too often. Tools are registered at startup; the policy can be
/// replaced at runtime and affects subsequent calls only.
pub struct ToolRegistry {
    /// Registered tools by normalized name.
    tools: HashMap<String, Arc<dyn Tool>>,
    policy: RwLock<ToolPolicy>,
    loop_detector: LoopDetector,
}

impl ToolRegistry {
    /// Create an empty registry with a default policy and loop detector.
    pub fn new() -> Self {
        Self::with_policy(ToolPolicy::default(), LoopDetector::new(true, 30, 10))
    }

    /// Create an empty registry with an explicit policy and loop detector.
    pub fn with_policy(policy: ToolPolicy, loop_detector: LoopDetector) -> Self {
        Self {
            tools: HashMap::new(),
            policy: RwLock::new(policy),
            loop_detector,
        }
    }

    /// Create an empty registry configured from global settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_policy(
            ToolPolicy::from_settings(settings),
            LoopDetector::new(
                settings.tool_loop_detection_enabled,
                settings.tool_loop_history_size,
                settings.tool_loop_critical_threshold,
            ),
        )
    }

    /// Register a tool.
    ///
    /// If a tool with the same name already exists, it will be replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_shared(Arc::new(tool));
    }

    /// Register a shared tool.
    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) {
        let name = normalize_tool_name(tool.name());
        info!("Registering tool: {}", name);
        self.tools.insert(name, tool);
    }

    /// Check if a tool is registered.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(&normalize_tool_name(name))
    }

    /// Get tool descriptions for help text.
    pub fn get_descriptions(&self) -> Vec<(&str, &str)> {
        let mut descriptions: Vec<(&str, &str)> = self
            .tools
            .values()
            .map(|t| (t.name(), t.description()))
            .collect();
        descriptions.sort();
        descriptions
    }

    /// Replace the policy.
    pub async fn set_policy(&self, policy: ToolPolicy) {
        info!("Tool policy set to profile {}", policy.profile);
        *self.policy.write().await = policy;
    }

    /// Current policy.
    pub async fn policy(&self) -> ToolPolicy {
        self.policy.read().await.clone()
    }

    /// Sorted names of registered tools the current policy allows.
    pub async fn available(&self) -> Vec<String> {
        let policy = self.policy.read().await;
        let mut names: Vec<String> = self
            .tools
            .keys()
            .filter(|name| policy.is_allowed(name))
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Dispatch a tool call.
    ///
    /// Never fails: unknown tools, policy denials, loop blocks and tool
    /// errors all come back as a `ToolResult` with `ok == false`.
    pub async fn run(&self, tool_name: &str, payload: Value) -> ToolResult {
        let name = normalize_tool_name(tool_name);

        let Some(tool) = self.tools.get(&name) else {
            return ToolResult::failure(&name, json!({}), format!("Unknown tool: {}", name));
        };

        if !self.policy.read().await.is_allowed(&name) {
            warn!("Tool blocked by policy: {}", name);
            return ToolResult::blocked(
                &name,
                "policy_denied",
                format!("Tool blocked by policy: {}", name),
            );
        }

        if self.loop_detector.check(&name, &payload).await {
            warn!("Loop protection blocked repeated call to {}", name);
            return ToolResult::blocked(
                &name,
                "loop_detected",
                format!("Loop protection blocked repeated call to {}", name),
            );
        }

        debug!("Executing tool '{}'", name);

        match tool.run(ToolArgs::from_value(payload)).await {
            Ok(result) => {
                debug!("Tool '{}' completed: ok={}", name, result.ok);
                result
            }
            Err(error) => {
                debug!("Tool '{}' failed: {}", name, error);
                ToolResult::failure(&name, json!({}), error.to_string())
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
