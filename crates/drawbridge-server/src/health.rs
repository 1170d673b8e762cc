//! `/health` endpoint.

use std::time::Instant;

use serde::Serialize;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: &'static str,
    /// Crate version, for deploy verification.
    pub version: &'static str,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Sessions with a live plugin transport.
    pub connected_sessions: usize,
    /// Updates queued across all sessions awaiting a connection.
    pub queued_updates: usize,
}

impl HealthResponse {
    /// Assemble the response from the server start time and broker counters.
    #[must_use]
    pub fn collect(start_time: Instant, connected_sessions: usize, queued_updates: usize) -> Self {
        Self {
            status: "ok",
            version: drawbridge_core::constants::VERSION,
            uptime_secs: start_time.elapsed().as_secs(),
            connected_sessions,
            queued_updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn reports_ok_with_version() {
        let resp = HealthResponse::collect(Instant::now(), 0, 0);
        assert_eq!(resp.status, "ok");
        assert_eq!(resp.version, drawbridge_core::constants::VERSION);
    }

    #[test]
    fn uptime_measured_from_start() {
        let fresh = HealthResponse::collect(Instant::now(), 0, 0);
        assert!(fresh.uptime_secs < 2);

        let backdated = Instant::now()
            .checked_sub(Duration::from_secs(90))
            .unwrap();
        let aged = HealthResponse::collect(backdated, 0, 0);
        assert!(aged.uptime_secs >= 89);
    }

    #[test]
    fn counters_come_from_the_broker() {
        let resp = HealthResponse::collect(Instant::now(), 3, 17);
        assert_eq!(resp.connected_sessions, 3);
        assert_eq!(resp.queued_updates, 17);
    }

    #[test]
    fn json_shape() {
        let resp = HealthResponse::collect(Instant::now(), 2, 1);
        let parsed: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&resp).unwrap()).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["version"], drawbridge_core::constants::VERSION);
        assert_eq!(parsed["connected_sessions"], 2);
        assert_eq!(parsed["queued_updates"], 1);
        assert!(parsed["uptime_secs"].is_number());
    }
}
