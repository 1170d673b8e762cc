//! Broker error types.

use thiserror::Error;

/// Stable code for serialization failures.
pub const SERIALIZE: &str = "SERIALIZE";

/// Errors surfaced by the broker to its immediate caller.
///
/// Delivery problems (dead transport, offline plugin) are never errors: they
/// degrade to queued delivery. The only hard failure is structural — a
/// payload that cannot be put on the wire at all.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The update payload could not be serialized into a wire frame.
    #[error("{message}")]
    Serialize {
        /// Human-readable cause from the serializer.
        message: String,
    },
}

impl BrokerError {
    /// Stable string code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Serialize { .. } => SERIALIZE,
        }
    }
}

impl From<serde_json::Error> for BrokerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize {
            message: err.to_string(),
        }
    }
}
