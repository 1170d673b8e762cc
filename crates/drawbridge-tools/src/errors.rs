//! Tool error types.

use drawbridge_broker::BrokerError;
use thiserror::Error;

/// Stable code for parameter validation failures.
pub const VALIDATION: &str = "VALIDATION";
/// Stable code for failures inside the broker.
pub const BROKER: &str = "BROKER";

/// Errors a tool handler can return.
///
/// These are folded into error replies by the registry's dispatch; the
/// messages are user-facing and rendered with an `Error: ` prefix.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Parameter validation failed.
    #[error("{message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// The broker rejected the command.
    #[error("{0}")]
    Broker(#[from] BrokerError),
}

impl ToolError {
    /// Stable string code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => VALIDATION,
            Self::Broker(_) => BROKER,
        }
    }

    /// Shorthand for a validation failure.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_displays_bare_message() {
        let err = ToolError::validation("fileId is required");
        assert_eq!(err.to_string(), "fileId is required");
        assert_eq!(err.code(), VALIDATION);
    }

    #[test]
    fn broker_error_converts() {
        let err: ToolError = BrokerError::Serialize {
            message: "bad payload".into(),
        }
        .into();
        assert_eq!(err.code(), BROKER);
        assert_eq!(err.to_string(), "bad payload");
    }
}
