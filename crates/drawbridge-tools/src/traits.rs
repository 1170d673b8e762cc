//! Core trait and execution context for the tool system.

use std::sync::Arc;

use async_trait::async_trait;
use drawbridge_broker::SessionBroker;
use serde_json::Value;

use crate::errors::ToolError;
use crate::reply::ToolReply;

/// Execution context passed to every tool invocation.
#[derive(Clone, Debug)]
pub struct ToolContext {
    /// The session broker commands and reads go through.
    pub broker: Arc<SessionBroker>,
}

impl ToolContext {
    /// Create a context around a broker.
    #[must_use]
    pub fn new(broker: Arc<SessionBroker>) -> Self {
        Self { broker }
    }
}

/// The trait every tool implements.
///
/// Tools receive raw JSON parameters, validate them, and produce a
/// [`ToolReply`]. A returned [`ToolError`] is folded into an error reply by
/// the registry; handlers use it for validation and broker failures rather
/// than crafting error replies by hand.
#[async_trait]
pub trait BridgeTool: Send + Sync {
    /// Tool name — the exact string the automation client calls.
    fn name(&self) -> &str;

    /// Execute the tool with JSON arguments.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolReply, ToolError>;
}
