//! Broker orchestration: send-or-queue, transport lifecycle, snapshot
//! ingest, and the bounded-wait variables read.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use drawbridge_core::constants::SNAPSHOT_TTL_SECS;
use drawbridge_core::{FileId, PluginId, UpdateEnvelope, VariablesSnapshot, variables_request};
use metrics::counter;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, trace, warn};

use crate::cache::SnapshotCache;
use crate::error::BrokerError;
use crate::link::PluginLink;
use crate::queue::OutboundQueue;
use crate::registry::{SessionRegistry, SessionStatus};

/// Tuning knobs for a [`SessionBroker`].
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Maximum updates queued per file while its plugin is offline.
    pub queue_capacity: usize,
    /// Lifetime of a cached variables snapshot.
    pub snapshot_ttl: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            snapshot_ttl: Duration::from_secs(SNAPSHOT_TTL_SECS),
        }
    }
}

/// How a `send` was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Written straight to the live transport.
    Direct,
    /// Held in the outbound queue until a transport registers.
    Queued,
}

/// Result of a bounded-wait variables read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// A fresh snapshot was available, possibly after waiting.
    Ready(VariablesSnapshot),
    /// The wait budget elapsed. The fetch remains outstanding; a later read
    /// may find its answer cached.
    TimedOut,
}

/// The orchestrator every caller goes through.
///
/// Owns the registry, the outbound queue, and the snapshot cache; nothing
/// else mutates them. Safe under concurrent invocation: operations touching
/// one file's state are serialized by a per-session guard, while different
/// sessions proceed independently. The guard is never held across a sleep
/// or transport await, only across the synchronous mutation itself.
#[derive(Debug)]
pub struct SessionBroker {
    registry: SessionRegistry,
    queue: OutboundQueue,
    cache: SnapshotCache,
    guards: Mutex<HashMap<FileId, Arc<AsyncMutex<()>>>>,
    next_id: AtomicU64,
}

impl SessionBroker {
    /// Create a broker with the given tuning.
    #[must_use]
    pub fn new(config: &BrokerConfig) -> Self {
        Self {
            registry: SessionRegistry::new(),
            queue: OutboundQueue::new(config.queue_capacity),
            cache: SnapshotCache::new(config.snapshot_ttl),
            guards: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(seed_id()),
        }
    }

    /// Accept an update for `file`, delivering it now or queueing it.
    ///
    /// Returns [`Delivery::Direct`] when the update was written to a live
    /// transport and [`Delivery::Queued`] when it was held for the next
    /// connection. Both mean "accepted"; a dead transport discovered during
    /// the write demotes the session to queued delivery rather than failing
    /// the caller. The only hard error is a payload that cannot be
    /// serialized at all.
    pub async fn send(&self, file: &FileId, updates: Value) -> Result<Delivery, BrokerError> {
        let guard = self.guard(file);
        let _held = guard.lock().await;

        let envelope = self.next_envelope(updates);
        let frame = serde_json::to_string(&envelope)?;

        if let Some(link) = self.registry.link(file) {
            if link.send_text(&frame) {
                self.registry.touch(file);
                trace!(file = %file, id = envelope.id, "update sent on live transport");
                counter!("updates_delivered_total", "mode" => "direct").increment(1);
                return Ok(Delivery::Direct);
            }
            warn!(
                file = %file,
                connection = %link.id(),
                "write to live transport failed; demoting session to queued delivery"
            );
            self.registry.unregister(file);
            link.close();
        }

        self.registry.ensure_pending(file);
        if let Some(evicted) = self.queue.append(file, envelope) {
            warn!(file = %file, evicted_id = evicted.id, "outbound queue full; dropped oldest update");
            counter!("updates_dropped_total").increment(1);
        }
        debug!(file = %file, depth = self.queue.len(file), "update queued for offline session");
        counter!("updates_delivered_total", "mode" => "queued").increment(1);
        Ok(Delivery::Queued)
    }

    /// Register a freshly opened transport and flush any queued updates to
    /// it, oldest first.
    ///
    /// A transport already registered for the same file is closed and
    /// replaced. If the new transport dies mid-flush, the unsent updates —
    /// including the one that failed — go back to the front of the queue
    /// for the next connection; the failed one may therefore be delivered
    /// twice, never zero times.
    pub async fn attach_transport(&self, link: PluginLink) {
        let file = link.file().clone();
        let guard = self.guard(&file);
        let _held = guard.lock().await;

        if let Some(old) = self.registry.register(link.clone()) {
            info!(
                file = %file,
                superseded = %old.id(),
                connection = %link.id(),
                "transport attached, superseding previous one"
            );
        } else {
            info!(file = %file, plugin = %link.plugin(), connection = %link.id(), "transport attached");
        }

        let pending = self.queue.drain(&file);
        if pending.is_empty() {
            return;
        }
        info!(file = %file, count = pending.len(), "flushing queued updates");

        let mut iter = pending.into_iter();
        while let Some(envelope) = iter.next() {
            let frame = match serde_json::to_string(&envelope) {
                Ok(frame) => frame,
                Err(err) => {
                    // Queued envelopes already serialized once at enqueue time.
                    warn!(file = %file, id = envelope.id, error = %err, "skipping unserializable queued update");
                    continue;
                }
            };
            if !link.send_text(&frame) {
                let mut rest = vec![envelope];
                rest.extend(iter);
                warn!(
                    file = %file,
                    requeued = rest.len(),
                    "transport failed mid-flush; updates kept for the next connection"
                );
                self.queue.requeue_front(&file, rest);
                self.registry.unregister(&file);
                link.close();
                return;
            }
            counter!("updates_flushed_total").increment(1);
        }
        self.registry.touch(&file);
    }

    /// Handle a transport close or error.
    ///
    /// Resolved through the link's own stamp; a close event from a link
    /// that has already been superseded is ignored, so it cannot tear down
    /// the session's current transport.
    pub async fn detach_transport(&self, link: &PluginLink) {
        let guard = self.guard(link.file());
        let _held = guard.lock().await;

        if let Some(file) = self.registry.session_for(link) {
            info!(file = %file, connection = %link.id(), "transport detached; session pending");
            self.registry.unregister(&file);
        } else {
            debug!(connection = %link.id(), "detach from superseded transport ignored");
        }
    }

    /// Close every live transport, asking each session task to send a Close
    /// frame and tear down. Used at server shutdown; queued updates and
    /// cached snapshots are left in place.
    pub fn close_all_transports(&self) {
        let links = self.registry.live_links();
        if links.is_empty() {
            return;
        }
        info!(count = links.len(), "closing all live transports");
        for link in links {
            link.close();
        }
    }

    /// Store a variables snapshot pushed by the plugin on `link`.
    pub async fn ingest_snapshot(
        &self,
        link: &PluginLink,
        variables: Vec<Value>,
        collections: Vec<Value>,
    ) {
        let guard = self.guard(link.file());
        let _held = guard.lock().await;

        let Some(file) = self.registry.session_for(link) else {
            debug!(connection = %link.id(), "snapshot from superseded transport ignored");
            return;
        };
        debug!(
            file = %file,
            variables = variables.len(),
            collections = collections.len(),
            "variables snapshot cached"
        );
        self.cache.store(
            &file,
            VariablesSnapshot {
                variables,
                collections,
            },
        );
        self.registry.touch(&file);
        counter!("snapshots_ingested_total").increment(1);
    }

    /// Read the variables snapshot for `file`, waiting up to `max_wait` for
    /// the plugin to answer.
    ///
    /// A fresh cache entry is returned immediately with no traffic. On a
    /// miss, exactly one fetch is dispatched through [`send`](Self::send)
    /// (so it is queued if the plugin is offline) and the cache is re-read
    /// every `poll_interval` until it fills or the attempt budget runs out.
    /// [`ReadOutcome::TimedOut`] is a normal outcome, not an error: the
    /// fetch is not retracted, and a later call can pick up the answer.
    pub async fn read_variables(
        &self,
        file: &FileId,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> Result<ReadOutcome, BrokerError> {
        if let Some(snapshot) = self.cache.get(file) {
            trace!(file = %file, "variables served from cache");
            return Ok(ReadOutcome::Ready(snapshot));
        }

        let delivery = self.send(file, variables_request()).await?;
        debug!(file = %file, ?delivery, "variables fetch dispatched; polling cache");

        for _ in 0..max_attempts(max_wait, poll_interval) {
            tokio::time::sleep(poll_interval).await;
            if let Some(snapshot) = self.cache.get(file) {
                return Ok(ReadOutcome::Ready(snapshot));
            }
        }

        debug!(file = %file, ?max_wait, "variables fetch still outstanding; reporting timeout");
        Ok(ReadOutcome::TimedOut)
    }

    /// Drop the cached snapshot for `file`, forcing the next read to fetch.
    pub async fn clear_snapshot(&self, file: &FileId) {
        let guard = self.guard(file);
        let _held = guard.lock().await;
        self.cache.clear(file);
    }

    /// Record liveness for `file` without touching its connection status.
    ///
    /// Creates a Pending record when the file has never been seen, so a
    /// plugin probing over HTTP before opening its socket becomes visible.
    pub async fn heartbeat(&self, file: &FileId, plugin: &PluginId) {
        let guard = self.guard(file);
        let _held = guard.lock().await;
        self.registry.ensure_pending(file);
        self.registry.touch(file);
        trace!(file = %file, plugin = %plugin, "heartbeat");
    }

    /// Connection status of `file`.
    pub fn session_status(&self, file: &FileId) -> SessionStatus {
        self.registry.status(file)
    }

    /// Updates currently queued for `file`.
    pub fn queue_depth(&self, file: &FileId) -> usize {
        self.queue.len(file)
    }

    /// Sessions with a live transport.
    pub fn connected_sessions(&self) -> usize {
        self.registry.connected_count()
    }

    /// Updates queued across all sessions.
    pub fn queued_updates(&self) -> usize {
        self.queue.total_len()
    }

    /// Updates dropped at the queue bound since startup.
    pub fn dropped_updates(&self) -> u64 {
        self.queue.dropped_count()
    }

    /// Snapshots currently cached, stale ones included.
    pub fn cached_snapshots(&self) -> usize {
        self.cache.len()
    }

    fn next_envelope(&self, updates: Value) -> UpdateEnvelope {
        UpdateEnvelope::new(self.next_id.fetch_add(1, Ordering::Relaxed), updates)
    }

    fn guard(&self, file: &FileId) -> Arc<AsyncMutex<()>> {
        let mut guards = self.guards.lock();
        Arc::clone(guards.entry(file.clone()).or_default())
    }
}

impl Default for SessionBroker {
    fn default() -> Self {
        Self::new(&BrokerConfig::default())
    }
}

/// Message IDs start at the broker's birth time in epoch milliseconds, so
/// they stay unique and increasing within a process.
fn seed_id() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Number of cache re-checks that fit in the wait budget; at least one.
fn max_attempts(max_wait: Duration, poll_interval: Duration) -> u64 {
    let interval = poll_interval.as_millis().max(1);
    let attempts = (max_wait.as_millis() / interval).max(1);
    u64::try_from(attempts).unwrap_or(u64::MAX)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
