//! Branded identifier newtypes.
//!
//! Every identifier in the drawbridge system has a distinct newtype wrapper
//! around `String`. This prevents accidentally passing a plugin ID where a
//! file key is expected.
//!
//! [`FileId`] and [`PluginId`] arrive from the outside world (the plugin's
//! connection handshake) and are never generated locally, so neither has a
//! constructor that invents a value. [`ConnectionId`] identifies one
//! transport registration and is generated as a UUID v7 so connection IDs
//! sort by creation time.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing string value.
            #[must_use]
            pub fn from_string(value: String) -> Self {
                Self(value)
            }

            /// The identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Unwrap into the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                self.0.as_str()
            }
        }
    };
}

string_id! {
    /// Key of one logical design-file session. Supplied by the plugin at
    /// connection time; uniquely determines at most one live transport, one
    /// outbound queue, and one cached snapshot.
    FileId
}

string_id! {
    /// Identifier of the plugin instance on the other end of a transport.
    PluginId
}

string_id! {
    /// Identity of a single transport registration. Two connections for the
    /// same file get distinct `ConnectionId`s, which is how a late close
    /// event from a superseded socket is told apart from the live one.
    ConnectionId
}

impl ConnectionId {
    /// Generate a fresh connection identity (UUID v7, time-ordered).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
