//! Tool registry — central index and dispatch.
//!
//! Maps tool names to [`BridgeTool`] implementations and owns the dispatch
//! path: lookup, execution under a timeout, and folding handler errors into
//! user-facing error replies. Handlers never panic the dispatcher.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use serde_json::Value;
use tracing::{debug, warn};

use crate::reply::ToolReply;
use crate::traits::{BridgeTool, ToolContext};

/// Central registry mapping tool names to their implementations.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn BridgeTool>>,
}

impl ToolRegistry {
    /// Maximum time a single tool call is allowed to run.
    const TOOL_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Overwrites any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn BridgeTool>) {
        debug!(tool_name = tool.name(), "tool registered");
        let _ = self.tools.insert(tool.name().to_owned(), tool);
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn BridgeTool>> {
        self.tools.get(name).cloned()
    }

    /// Return all tool names, sorted alphabetically.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Remove a tool by name, returning it if it existed.
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn BridgeTool>> {
        self.tools.remove(name)
    }

    /// Whether a tool with the given name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Dispatch a tool call by name.
    ///
    /// Always produces a reply: unknown tools, handler errors, and timeouts
    /// all come back as error replies rather than panics or transport
    /// failures.
    pub async fn dispatch(&self, name: &str, params: Value, ctx: &ToolContext) -> ToolReply {
        counter!("tool_requests_total", "tool" => name.to_owned()).increment(1);

        let Some(tool) = self.get(name) else {
            counter!("tool_errors_total", "tool" => name.to_owned(), "error_type" => "unknown_tool")
                .increment(1);
            warn!(tool = name, "unknown tool requested");
            return ToolReply::error(format!("Error: Unknown tool '{name}'"));
        };

        let start = std::time::Instant::now();
        let result = tokio::time::timeout(Self::TOOL_TIMEOUT, tool.execute(params, ctx)).await;

        let reply = match result {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                counter!("tool_errors_total", "tool" => name.to_owned(), "error_type" => err.code())
                    .increment(1);
                ToolReply::error(format!("Error: {err}"))
            }
            Err(_elapsed) => {
                counter!("tool_errors_total", "tool" => name.to_owned(), "error_type" => "timeout")
                    .increment(1);
                tracing::error!(tool = name, "tool call timed out after {:?}", Self::TOOL_TIMEOUT);
                ToolReply::error(format!("Error: Tool '{name}' timed out"))
            }
        };

        let duration = start.elapsed();
        histogram!("tool_duration_seconds", "tool" => name.to_owned())
            .record(duration.as_secs_f64());

        if duration.as_secs() >= 5 {
            warn!(
                tool = name,
                duration_secs = duration.as_secs_f64(),
                "slow tool call"
            );
        }

        reply
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
