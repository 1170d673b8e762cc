//! Package-level constants.

/// Current version of the drawbridge workspace (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "drawbridge";

/// Default TCP port for the plugin-facing HTTP + `WebSocket` server.
pub const DEFAULT_PORT: u16 = 5678;

/// How long a cached variables snapshot stays valid.
pub const SNAPSHOT_TTL_SECS: u64 = 300;

/// Ceiling on how long a variables read waits for the plugin to answer.
pub const FETCH_WAIT_MS: u64 = 5_000;

/// Interval between cache re-checks while a variables read is waiting.
pub const FETCH_POLL_MS: u64 = 100;

/// Placeholder plugin ID for a session that has queued commands but has
/// never seen a live connection.
pub const PENDING_PLUGIN_ID: &str = "pending-connection";
