//! Last-known variables snapshot per file, with a TTL.
//!
//! The cache is what turns the plugin's one-way pushes into answerable
//! reads: the transport layer stores every `variables-response` here, and
//! readers poll it instead of holding a reference to any particular waiter.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use drawbridge_core::{FileId, VariablesSnapshot};
use parking_lot::Mutex;

/// Default snapshot lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(drawbridge_core::constants::SNAPSHOT_TTL_SECS);

#[derive(Debug, Clone)]
struct CachedSnapshot {
    snapshot: VariablesSnapshot,
    stored_at: Instant,
}

/// Snapshot store with fixed-window expiry.
///
/// An entry is valid while `now - stored_at < ttl`; each store resets the
/// full window. Stale entries are evicted lazily, on the lookup that finds
/// them expired.
#[derive(Debug)]
pub struct SnapshotCache {
    entries: Mutex<HashMap<FileId, CachedSnapshot>>,
    ttl: Duration,
}

impl SnapshotCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Store (or overwrite) the snapshot for `file`, stamping it now.
    pub fn store(&self, file: &FileId, snapshot: VariablesSnapshot) {
        let entry = CachedSnapshot {
            snapshot,
            stored_at: Instant::now(),
        };
        drop(self.entries.lock().insert(file.clone(), entry));
    }

    /// Fetch the snapshot for `file` if present and fresh.
    ///
    /// A stale entry is deleted as a side effect and reported absent.
    pub fn get(&self, file: &FileId) -> Option<VariablesSnapshot> {
        let mut entries = self.entries.lock();
        let entry = entries.get(file)?;
        if entry.stored_at.elapsed() >= self.ttl {
            drop(entries.remove(file));
            return None;
        }
        Some(entry.snapshot.clone())
    }

    /// Explicitly invalidate the snapshot for `file`.
    pub fn clear(&self, file: &FileId) {
        drop(self.entries.lock().remove(file));
    }

    /// Number of entries currently held, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(marker: &str) -> VariablesSnapshot {
        VariablesSnapshot {
            variables: vec![json!({ "id": marker })],
            collections: vec![],
        }
    }

    #[test]
    fn store_then_get() {
        let cache = SnapshotCache::default();
        let file = FileId::from("f1");
        cache.store(&file, snapshot("v1"));

        let hit = cache.get(&file).expect("fresh entry");
        assert_eq!(hit.variables[0]["id"], "v1");
    }

    #[test]
    fn get_missing_returns_none() {
        let cache = SnapshotCache::default();
        assert!(cache.get(&FileId::from("nope")).is_none());
    }

    #[test]
    fn stale_entry_is_absent_and_evicted() {
        let cache = SnapshotCache::new(Duration::from_millis(0));
        let file = FileId::from("f1");
        cache.store(&file, snapshot("v1"));
        assert_eq!(cache.len(), 1);

        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get(&file).is_none());
        assert_eq!(cache.len(), 0, "stale entry must be deleted on lookup");
    }

    #[test]
    fn store_resets_the_window() {
        let cache = SnapshotCache::new(Duration::from_millis(50));
        let file = FileId::from("f1");
        cache.store(&file, snapshot("old"));

        std::thread::sleep(Duration::from_millis(30));
        cache.store(&file, snapshot("new"));

        std::thread::sleep(Duration::from_millis(30));
        // 60ms after the first store but only 30ms after the second
        let hit = cache.get(&file).expect("window restarted at second store");
        assert_eq!(hit.variables[0]["id"], "new");
    }

    #[test]
    fn clear_removes_entry() {
        let cache = SnapshotCache::default();
        let file = FileId::from("f1");
        cache.store(&file, snapshot("v1"));
        cache.clear(&file);
        assert!(cache.get(&file).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn files_are_independent() {
        let cache = SnapshotCache::default();
        let f1 = FileId::from("f1");
        let f2 = FileId::from("f2");
        cache.store(&f1, snapshot("a"));
        cache.store(&f2, snapshot("b"));

        cache.clear(&f1);
        assert!(cache.get(&f1).is_none());
        assert_eq!(cache.get(&f2).unwrap().variables[0]["id"], "b");
    }

    #[test]
    fn overwrite_replaces_snapshot() {
        let cache = SnapshotCache::default();
        let file = FileId::from("f1");
        cache.store(&file, snapshot("first"));
        cache.store(&file, snapshot("second"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&file).unwrap().variables[0]["id"], "second");
    }
}
