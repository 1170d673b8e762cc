//! Tool reply types returned to the automation client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One content block inside a tool reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Plain text.
    Text {
        /// The text payload.
        text: String,
    },
}

/// Reply for one tool call.
///
/// Serializes as `{"content": [...], "isError": true}` with `isError`
/// omitted when false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolReply {
    /// Ordered content blocks.
    pub content: Vec<ToolContent>,
    /// Set when the reply describes a failure.
    #[serde(
        rename = "isError",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_error: bool,
}

impl ToolReply {
    /// A successful single-text reply.
    #[must_use]
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: false,
        }
    }

    /// A failure reply carrying the given message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// A successful reply whose text is `value` pretty-printed.
    #[must_use]
    pub fn json(value: &Value) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        Self::text(text)
    }

    /// The first text block, for callers that expect a single message.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|block| {
            let ToolContent::Text { text } = block;
            text.as_str()
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
