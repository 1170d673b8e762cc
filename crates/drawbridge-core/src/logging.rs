//! Structured logging with `tracing`.
//!
//! All drawbridge crates log through the `tracing` macros; this module owns
//! the one-time subscriber setup for binaries and tests. Two output flavors
//! are offered: a compact console format for interactive use and JSON lines
//! for log shippers.

use tracing_subscriber::EnvFilter;

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the global subscriber with compact stderr output.
///
/// `RUST_LOG` overrides `default_level` when set. Safe to call more than
/// once; only the first call installs a subscriber.
pub fn init_subscriber(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Initialize the global subscriber with one JSON object per line on stderr.
///
/// Same filter and idempotency rules as [`init_subscriber`].
pub fn init_json_subscriber(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .json()
        .with_current_span(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_subscriber("warn");
        init_subscriber("debug");
        init_json_subscriber("info");
    }
}
