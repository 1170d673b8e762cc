//! Parameter extraction helpers shared by the tool handlers.
//!
//! Required fields treat "missing", "wrong type", and "empty string" the
//! same way, so callers get one consistent `<key> is required` message.

use serde_json::Value;

use crate::errors::ToolError;

/// A required, non-empty string parameter.
pub(crate) fn require_string(params: &Value, key: &str) -> Result<String, ToolError> {
    match params.get(key).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_owned()),
        _ => Err(ToolError::validation(format!("{key} is required"))),
    }
}

/// An optional string parameter; absent, null, or non-string reads as `None`.
pub(crate) fn optional_string(params: &Value, key: &str) -> Option<String> {
    params.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// An optional parameter of any shape; `null` reads as absent.
pub(crate) fn optional_value(params: &Value, key: &str) -> Option<Value> {
    params.get(key).filter(|v| !v.is_null()).cloned()
}

/// An optional non-negative integer parameter.
pub(crate) fn optional_u64(params: &Value, key: &str) -> Option<u64> {
    params.get(key).and_then(Value::as_u64)
}
