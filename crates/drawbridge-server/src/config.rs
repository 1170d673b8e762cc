//! Server configuration.
//!
//! Loading order: compiled defaults ← optional JSON file ← `DRAWBRIDGE_*`
//! environment overrides. CLI flags are applied on top by the binary.
//! Invalid environment values are logged and ignored rather than failing
//! startup.

use std::path::Path;
use std::time::Duration;

use drawbridge_broker::BrokerConfig;
use drawbridge_core::constants::{DEFAULT_PORT, SNAPSHOT_TTL_SECS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to read or parse a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON for [`ServerConfig`].
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration for the bridge server.
///
/// Every field is optional in the JSON file; missing fields keep their
/// defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `5678`; `0` auto-assigns, used by tests).
    pub port: u16,
    /// Per-connection outbound channel capacity.
    pub channel_capacity: usize,
    /// Maximum updates queued per file while its plugin is offline.
    pub queue_capacity: usize,
    /// Lifetime of a cached variables snapshot, in seconds.
    pub snapshot_ttl_secs: u64,
    /// Interval between server-initiated Ping frames, in seconds.
    pub ping_interval_secs: u64,
    /// Close the connection after this many seconds without a Pong.
    pub pong_timeout_secs: u64,
    /// Max `WebSocket` message size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: DEFAULT_PORT,
            channel_capacity: 1024,
            queue_capacity: 1024,
            snapshot_ttl_secs: SNAPSHOT_TTL_SECS,
            ping_interval_secs: 30,
            pong_timeout_secs: 60,
            max_message_size: 16 * 1024 * 1024, // 16 MiB
        }
    }
}

impl ServerConfig {
    /// Load configuration: defaults, then the JSON file at `path` if given,
    /// then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply `DRAWBRIDGE_*` environment overrides in place.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = read_env_string("DRAWBRIDGE_HOST") {
            self.host = v;
        }
        if let Some(v) = read_env_u16("DRAWBRIDGE_PORT", 1, 65535) {
            self.port = v;
        }
        if let Some(v) = read_env_usize("DRAWBRIDGE_CHANNEL_CAPACITY", 1, 1_000_000) {
            self.channel_capacity = v;
        }
        if let Some(v) = read_env_usize("DRAWBRIDGE_QUEUE_CAPACITY", 1, 1_000_000) {
            self.queue_capacity = v;
        }
        if let Some(v) = read_env_u64("DRAWBRIDGE_SNAPSHOT_TTL_SECS", 1, 86_400) {
            self.snapshot_ttl_secs = v;
        }
        if let Some(v) = read_env_u64("DRAWBRIDGE_PING_INTERVAL_SECS", 1, 3_600) {
            self.ping_interval_secs = v;
        }
        if let Some(v) = read_env_u64("DRAWBRIDGE_PONG_TIMEOUT_SECS", 1, 3_600) {
            self.pong_timeout_secs = v;
        }
        if let Some(v) = read_env_usize("DRAWBRIDGE_MAX_MESSAGE_SIZE", 1024, 1_073_741_824) {
            self.max_message_size = v;
        }
    }

    /// The broker's slice of this configuration.
    #[must_use]
    pub fn broker_config(&self) -> BrokerConfig {
        BrokerConfig {
            queue_capacity: self.queue_capacity,
            snapshot_ttl: Duration::from_secs(self.snapshot_ttl_secs),
        }
    }

    /// Ping interval as a [`Duration`].
    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    /// Pong deadline as a [`Duration`].
    #[must_use]
    pub fn pong_timeout(&self) -> Duration {
        Duration::from_secs(self.pong_timeout_secs)
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    let val = std::env::var(name).ok()?;
    let result = parse_u16_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let val = std::env::var(name).ok()?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
