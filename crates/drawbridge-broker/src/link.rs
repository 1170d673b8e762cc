//! Exclusive handle to one live plugin transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use drawbridge_core::{ConnectionId, FileId, PluginId};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// One live plugin connection, stamped with its session identity.
///
/// The link is created by the transport layer at handshake time and handed
/// to the broker. Stamping `file` and `plugin` onto the handle makes
/// resolving a session from an inbound event O(1), and the distinct
/// [`ConnectionId`] is how a close event from a superseded socket is told
/// apart from the currently registered one.
///
/// Clones share the underlying channel and cancellation token, so closing
/// any clone closes the connection.
#[derive(Clone, Debug)]
pub struct PluginLink {
    id: ConnectionId,
    file: FileId,
    plugin: PluginId,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
    connected_at: Instant,
    is_alive: Arc<AtomicBool>,
    last_pong: Arc<Mutex<Instant>>,
    dropped_frames: Arc<AtomicU64>,
}

impl PluginLink {
    /// Create a new link around the write half of a transport.
    pub fn new(file: FileId, plugin: PluginId, tx: mpsc::Sender<String>) -> Self {
        let now = Instant::now();
        Self {
            id: ConnectionId::new(),
            file,
            plugin,
            tx,
            cancel: CancellationToken::new(),
            connected_at: now,
            is_alive: Arc::new(AtomicBool::new(true)),
            last_pong: Arc::new(Mutex::new(now)),
            dropped_frames: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Identity of this registration.
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// File session this transport belongs to.
    pub fn file(&self) -> &FileId {
        &self.file
    }

    /// Plugin instance on the other end.
    pub fn plugin(&self) -> &PluginId {
        &self.plugin
    }

    /// Send a text frame to the plugin's write task.
    ///
    /// Returns `false` if the channel is full or closed; the caller treats
    /// either as a dead transport. Never blocks.
    pub fn send_text(&self, frame: &str) -> bool {
        if self.tx.try_send(frame.to_owned()).is_ok() {
            true
        } else {
            let _ = self.dropped_frames.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Frames that could not be handed to the write task.
    pub fn drop_count(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Ask the transport's session task to close the socket.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Whether [`close`](Self::close) has been called on any clone.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the link is closed. Usable in `tokio::select!`.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Mark the connection as alive (pong or inbound traffic received).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Check and reset the alive flag for the heartbeat loop.
    ///
    /// Returns `true` if the connection showed life since the last check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Duration since the last pong (or connection establishment).
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_link() -> (PluginLink, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(32);
        let link = PluginLink::new("file-1".into(), "plugin-1".into(), tx);
        (link, rx)
    }

    #[test]
    fn link_is_stamped_with_session_identity() {
        let (link, _rx) = make_link();
        assert_eq!(link.file().as_str(), "file-1");
        assert_eq!(link.plugin().as_str(), "plugin-1");
    }

    #[test]
    fn links_get_distinct_ids() {
        let (a, _rx_a) = make_link();
        let (b, _rx_b) = make_link();
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn send_text_delivers() {
        let (link, mut rx) = make_link();
        assert!(link.send_text("hello"));
        assert_eq!(rx.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn send_to_closed_channel_returns_false() {
        let (link, rx) = make_link();
        drop(rx);
        assert!(!link.send_text("hello"));
        assert_eq!(link.drop_count(), 1);
    }

    #[tokio::test]
    async fn send_to_full_channel_returns_false() {
        let (tx, _rx) = mpsc::channel(1);
        let link = PluginLink::new("file-1".into(), "plugin-1".into(), tx);
        assert!(link.send_text("first"));
        assert!(!link.send_text("second"));
        assert_eq!(link.drop_count(), 1);
    }

    #[test]
    fn close_is_visible_to_clones() {
        let (link, _rx) = make_link();
        let clone = link.clone();
        assert!(!clone.is_closed());
        link.close();
        assert!(clone.is_closed());
    }

    #[tokio::test]
    async fn closed_future_resolves_after_close() {
        let (link, _rx) = make_link();
        link.close();
        link.closed().await;
    }

    #[test]
    fn mark_alive_and_check() {
        let (link, _rx) = make_link();
        // Initially alive
        assert!(link.check_alive());
        // After check, no longer alive
        assert!(!link.check_alive());
        link.mark_alive();
        assert!(link.check_alive());
    }

    #[test]
    fn age_increases() {
        let (link, _rx) = make_link();
        let age1 = link.age();
        std::thread::sleep(Duration::from_millis(10));
        assert!(link.age() > age1);
    }

    #[test]
    fn last_pong_elapsed_resets_on_mark_alive() {
        let (link, _rx) = make_link();
        std::thread::sleep(Duration::from_millis(10));
        assert!(link.last_pong_elapsed() >= Duration::from_millis(10));
        link.mark_alive();
        assert!(link.last_pong_elapsed() < Duration::from_millis(10));
    }
}
