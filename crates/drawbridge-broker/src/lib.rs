//! # drawbridge-broker
//!
//! The session broker: accepts update commands for a design-file session
//! whether or not its plugin is currently connected, delivers them in order
//! once a transport exists, caches the plugin's variable snapshots, and
//! offers a bounded-wait read over the push-only channel.
//!
//! Components, leaves first:
//!
//! - [`PluginLink`] — exclusive handle to one live plugin transport
//! - [`SessionRegistry`] — per-file connection records and the live link
//! - [`OutboundQueue`] — per-file FIFO of updates awaiting a connection
//! - [`SnapshotCache`] — last variables snapshot per file, with a TTL
//! - [`SessionBroker`] — the orchestrator every caller goes through

#![deny(unsafe_code)]

pub mod broker;
pub mod cache;
pub mod error;
pub mod link;
pub mod queue;
pub mod registry;

pub use broker::{BrokerConfig, Delivery, ReadOutcome, SessionBroker};
pub use cache::SnapshotCache;
pub use error::BrokerError;
pub use link::PluginLink;
pub use queue::OutboundQueue;
pub use registry::{SessionRegistry, SessionStatus};
