//! Per-file connection records.
//!
//! Pure bookkeeping with a narrow mutation API; the broker is the only
//! caller. The invariant the registry exists to keep: **at most one live
//! transport per file session at any instant**.

use std::collections::HashMap;
use std::time::Instant;

use drawbridge_core::constants::PENDING_PLUGIN_ID;
use drawbridge_core::{FileId, PluginId};
use parking_lot::RwLock;

use crate::link::PluginLink;

/// Connection state of one file session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No record exists for this file.
    Disconnected,
    /// A record exists (queued commands or a past connection) but no live
    /// transport.
    Pending,
    /// A live transport is registered.
    Connected,
}

/// Bookkeeping for one file session.
#[derive(Debug)]
struct ConnectionRecord {
    plugin: PluginId,
    status: SessionStatus,
    last_seen: Instant,
    link: Option<PluginLink>,
}

/// Registry of connection records, keyed by file.
///
/// Records are created on first command or first connection and never
/// deleted; a disconnected session keeps its record (and `last_seen`) for
/// diagnostics. The set of active files is small and bounded in practice.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    records: RwLock<HashMap<FileId, ConnectionRecord>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `link` as the live transport for its file.
    ///
    /// Any previously registered link for the same file is closed before
    /// being replaced, and returned so the caller can log the supersession.
    pub fn register(&self, link: PluginLink) -> Option<PluginLink> {
        let mut records = self.records.write();
        let now = Instant::now();
        match records.get_mut(link.file()) {
            Some(record) => {
                let previous = record.link.take();
                if let Some(old) = &previous {
                    old.close();
                }
                record.plugin = link.plugin().clone();
                record.status = SessionStatus::Connected;
                record.last_seen = now;
                record.link = Some(link);
                previous
            }
            None => {
                let file = link.file().clone();
                let record = ConnectionRecord {
                    plugin: link.plugin().clone(),
                    status: SessionStatus::Connected,
                    last_seen: now,
                    link: Some(link),
                };
                drop(records.insert(file, record));
                None
            }
        }
    }

    /// Drop the live transport for `file`, keeping the record.
    ///
    /// The session moves to [`SessionStatus::Pending`] and `last_seen` is
    /// left untouched (it reflects the last real activity).
    pub fn unregister(&self, file: &FileId) {
        if let Some(record) = self.records.write().get_mut(file) {
            record.status = SessionStatus::Pending;
            record.link = None;
        }
    }

    /// Create a Pending record for `file` if none exists yet.
    ///
    /// Used when a command arrives for a file that has never connected; the
    /// plugin identity is a placeholder until a real handshake happens.
    pub fn ensure_pending(&self, file: &FileId) {
        let mut records = self.records.write();
        if !records.contains_key(file) {
            let record = ConnectionRecord {
                plugin: PluginId::from(PENDING_PLUGIN_ID),
                status: SessionStatus::Pending,
                last_seen: Instant::now(),
                link: None,
            };
            drop(records.insert(file.clone(), record));
        }
    }

    /// Whether `file` currently has a live transport.
    pub fn is_connected(&self, file: &FileId) -> bool {
        self.records
            .read()
            .get(file)
            .is_some_and(|r| r.status == SessionStatus::Connected && r.link.is_some())
    }

    /// Connection status of `file`; absent records report `Disconnected`.
    pub fn status(&self, file: &FileId) -> SessionStatus {
        self.records
            .read()
            .get(file)
            .map_or(SessionStatus::Disconnected, |r| r.status)
    }

    /// Clone of the live link for `file`, if connected.
    pub fn link(&self, file: &FileId) -> Option<PluginLink> {
        self.records.read().get(file).and_then(|r| r.link.clone())
    }

    /// Clones of every live link, across all sessions.
    pub fn live_links(&self) -> Vec<PluginLink> {
        self.records
            .read()
            .values()
            .filter_map(|r| r.link.clone())
            .collect()
    }

    /// Plugin identity recorded for `file`.
    pub fn plugin(&self, file: &FileId) -> Option<PluginId> {
        self.records.read().get(file).map(|r| r.plugin.clone())
    }

    /// Refresh `last_seen` for `file`.
    pub fn touch(&self, file: &FileId) {
        if let Some(record) = self.records.write().get_mut(file) {
            record.last_seen = Instant::now();
        }
    }

    /// When `file` last showed activity.
    pub fn last_seen(&self, file: &FileId) -> Option<Instant> {
        self.records.read().get(file).map(|r| r.last_seen)
    }

    /// Resolve the file session a link belongs to, if it is still the
    /// registered transport.
    ///
    /// The link carries its own file stamp, so this is a single map lookup;
    /// the [`ConnectionId`](drawbridge_core::ConnectionId) comparison filters
    /// out superseded links whose close events arrive late.
    pub fn session_for(&self, link: &PluginLink) -> Option<FileId> {
        let records = self.records.read();
        let record = records.get(link.file())?;
        let current = record.link.as_ref()?;
        (current.id() == link.id()).then(|| link.file().clone())
    }

    /// Number of sessions with a live transport.
    pub fn connected_count(&self) -> usize {
        self.records
            .read()
            .values()
            .filter(|r| r.status == SessionStatus::Connected)
            .count()
    }

    /// Total number of records, connected or not.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the registry holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
