//! # drawbridge-core
//!
//! Shared vocabulary for the drawbridge session broker.
//!
//! This crate provides the types every other drawbridge crate depends on:
//!
//! - **Branded IDs**: [`FileId`], [`PluginId`], [`ConnectionId`] as newtypes
//!   so a plugin identifier can never be passed where a file key is expected
//! - **Wire types**: the outbound [`UpdateEnvelope`], the inbound
//!   [`PluginMessage`] enum, and the cached [`VariablesSnapshot`]
//! - **Constants**: default port, cache TTL, fetch wait/poll intervals
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` subscriber

#![deny(unsafe_code)]

pub mod constants;
pub mod ids;
pub mod logging;
pub mod wire;

pub use ids::{ConnectionId, FileId, PluginId};
pub use wire::{PluginMessage, UpdateEnvelope, VariablesSnapshot, variables_request};
