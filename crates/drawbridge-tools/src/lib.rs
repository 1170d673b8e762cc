//! # drawbridge-tools
//!
//! The tool layer between the automation client and the session broker.
//!
//! Defines the [`BridgeTool`] trait, a [`ToolRegistry`] that dispatches
//! calls by name, and the handlers that turn tool parameters into update
//! payloads for the design-tool plugin:
//!
//! - **Nodes**: `create_node`, `update_node` (update or delete)
//! - **Variables**: `get_variables`, `create_variable`, `update_variable`,
//!   `delete_variable`
//!
//! Handlers validate their parameters, build the opaque update payload, and
//! hand it to the broker; whether the plugin is connected right now is the
//! broker's problem, not theirs.

#![deny(unsafe_code)]

pub mod errors;
pub mod handlers;
mod params;
pub mod registry;
pub mod reply;
pub mod traits;

pub use errors::ToolError;
pub use registry::ToolRegistry;
pub use reply::{ToolContent, ToolReply};
pub use traits::{BridgeTool, ToolContext};
