//! Per-file FIFO of updates awaiting delivery.
//!
//! Insertion order is delivery order. The queue is bounded per file: when an
//! append would exceed the capacity the **oldest** update is dropped and
//! handed back to the caller for logging, so a session whose plugin never
//! reconnects cannot grow memory without bound.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use drawbridge_core::{FileId, UpdateEnvelope};
use parking_lot::Mutex;

/// Ordered pending updates, keyed by file.
///
/// Used only by the broker; appends and drains for the same file are
/// serialized by the broker's per-session guard, the internal lock merely
/// keeps the map itself consistent across sessions.
#[derive(Debug)]
pub struct OutboundQueue {
    queues: Mutex<HashMap<FileId, VecDeque<UpdateEnvelope>>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl OutboundQueue {
    /// Create a queue holding at most `capacity` updates per file.
    ///
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    /// Append an update for `file`; O(1), never blocks.
    ///
    /// Returns the oldest update when the bound forced one out, `None`
    /// otherwise.
    pub fn append(&self, file: &FileId, envelope: UpdateEnvelope) -> Option<UpdateEnvelope> {
        let mut queues = self.queues.lock();
        let queue = queues.entry(file.clone()).or_default();
        let evicted = if queue.len() >= self.capacity {
            let _ = self.dropped.fetch_add(1, Ordering::Relaxed);
            queue.pop_front()
        } else {
            None
        };
        queue.push_back(envelope);
        evicted
    }

    /// Atomically remove and return everything queued for `file`, in FIFO
    /// order. Empty when nothing is queued.
    pub fn drain(&self, file: &FileId) -> Vec<UpdateEnvelope> {
        self.queues
            .lock()
            .remove(file)
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Put updates back at the front of `file`'s queue, preserving their
    /// order ahead of anything queued meanwhile.
    ///
    /// Used when a transport dies mid-flush; the bound is deliberately not
    /// applied here so nothing already accepted is lost.
    pub fn requeue_front(&self, file: &FileId, envelopes: Vec<UpdateEnvelope>) {
        if envelopes.is_empty() {
            return;
        }
        let mut queues = self.queues.lock();
        let queue = queues.entry(file.clone()).or_default();
        for envelope in envelopes.into_iter().rev() {
            queue.push_front(envelope);
        }
    }

    /// Updates currently queued for `file`.
    pub fn len(&self, file: &FileId) -> usize {
        self.queues.lock().get(file).map_or(0, VecDeque::len)
    }

    /// Whether nothing is queued for `file`.
    pub fn is_empty(&self, file: &FileId) -> bool {
        self.len(file) == 0
    }

    /// Updates queued across all files.
    pub fn total_len(&self) -> usize {
        self.queues.lock().values().map(VecDeque::len).sum()
    }

    /// Updates dropped at the bound since construction.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
