//! Wire types exchanged with the design-tool plugin.
//!
//! The broker never interprets command payloads; it wraps them in an
//! [`UpdateEnvelope`] on the way out and unwraps tagged [`PluginMessage`]s on
//! the way in. Everything inside `updates`, `variables`, and `collections`
//! stays opaque `serde_json::Value` data for the translation layer on the
//! plugin side.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Outbound message envelope written to the plugin transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEnvelope {
    /// Monotonically increasing message ID, derived from creation time.
    pub id: u64,
    /// RFC 3339 timestamp with millisecond precision.
    pub timestamp: String,
    /// Message kind; always `"update"` on this channel.
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque command payload, passed through untouched.
    pub updates: Value,
}

impl UpdateEnvelope {
    /// Wrap an opaque update payload, stamping the current time.
    #[must_use]
    pub fn new(id: u64, updates: Value) -> Self {
        Self {
            id,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            kind: "update".to_owned(),
            updates,
        }
    }
}

/// Inbound messages pushed by the plugin, tagged by `type`.
///
/// Only the kinds the broker consumes are listed; anything else fails to
/// parse and is ignored by the transport read loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PluginMessage {
    /// Full dump of design variables and collections for the session's file.
    VariablesResponse {
        /// Design variables, opaque records.
        #[serde(default)]
        variables: Vec<Value>,
        /// Variable collections, opaque records.
        #[serde(default)]
        collections: Vec<Value>,
    },
}

/// The most recent full state dump received from a plugin, as cached by the
/// broker and returned to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariablesSnapshot {
    /// Design variables, opaque to the broker.
    pub variables: Vec<Value>,
    /// Variable collections, opaque to the broker.
    pub collections: Vec<Value>,
}

/// The canonical payload asking a plugin for a full variables dump.
#[must_use]
pub fn variables_request() -> Value {
    json!({ "updates": [{ "type": "getVariables", "data": {} }] })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
