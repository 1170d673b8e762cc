//! Prometheus recorder setup and the metric names the bridge emits.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the global Prometheus recorder.
///
/// Call once at startup, before the broker or any session records a value;
/// the returned handle renders the `/metrics` endpoint.
pub fn install_recorder() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// Render the Prometheus text exposition from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Names recorded across the workspace, collected here so the exposition
// format is documented in one place.

/// Plugin connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// Plugin disconnections total (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active plugin connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Plugin session duration seconds (histogram).
pub const WS_SESSION_DURATION_SECONDS: &str = "ws_session_duration_seconds";
/// Updates accepted total (counter, labels: mode = direct | queued).
pub const UPDATES_DELIVERED_TOTAL: &str = "updates_delivered_total";
/// Queued updates flushed on reconnect (counter).
pub const UPDATES_FLUSHED_TOTAL: &str = "updates_flushed_total";
/// Updates dropped at queue overflow (counter).
pub const UPDATES_DROPPED_TOTAL: &str = "updates_dropped_total";
/// Variables snapshots ingested (counter).
pub const SNAPSHOTS_INGESTED_TOTAL: &str = "snapshots_ingested_total";
/// Tool requests total (counter, labels: tool).
pub const TOOL_REQUESTS_TOTAL: &str = "tool_requests_total";
/// Tool errors total (counter, labels: tool, error_type).
pub const TOOL_ERRORS_TOTAL: &str = "tool_errors_total";
/// Tool dispatch duration seconds (histogram, labels: tool).
pub const TOOL_DURATION_SECONDS: &str = "tool_duration_seconds";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_and_render() {
        // Build a recorder + handle (no global install to avoid test conflicts).
        let handle = PrometheusBuilder::new().build_recorder().handle();

        let output = handle.render();
        assert!(output.is_empty() || output.contains('#') || output.contains('\n'));
    }

    #[test]
    fn metric_constants_are_snake_case() {
        let names = [
            WS_CONNECTIONS_TOTAL,
            WS_DISCONNECTIONS_TOTAL,
            WS_CONNECTIONS_ACTIVE,
            WS_SESSION_DURATION_SECONDS,
            UPDATES_DELIVERED_TOTAL,
            UPDATES_FLUSHED_TOTAL,
            UPDATES_DROPPED_TOTAL,
            SNAPSHOTS_INGESTED_TOTAL,
            TOOL_REQUESTS_TOTAL,
            TOOL_ERRORS_TOTAL,
            TOOL_DURATION_SECONDS,
        ];
        for name in names {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name '{name}' must be snake_case"
            );
        }
    }
}
