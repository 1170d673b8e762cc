//! `BridgeServer` — Axum HTTP + `WebSocket` server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use drawbridge_broker::SessionBroker;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::health::HealthResponse;
use crate::ws;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The session broker.
    pub broker: Arc<SessionBroker>,
    /// Server configuration (channel capacity, ping/pong timing).
    pub config: ServerConfig,
    /// When the server started.
    pub start_time: Instant,
    /// Handle for rendering the `/metrics` endpoint.
    pub metrics: PrometheusHandle,
}

/// The plugin-facing bridge server.
pub struct BridgeServer {
    config: ServerConfig,
    broker: Arc<SessionBroker>,
    cancel: CancellationToken,
    start_time: Instant,
    metrics: PrometheusHandle,
}

impl BridgeServer {
    /// Create a new server around an existing broker.
    pub fn new(config: ServerConfig, broker: Arc<SessionBroker>, metrics: PrometheusHandle) -> Self {
        Self {
            config,
            broker,
            cancel: CancellationToken::new(),
            start_time: Instant::now(),
            metrics,
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            broker: self.broker.clone(),
            config: self.config.clone(),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/plugin/ws", get(ws::ws_handler))
            .route("/plugin/healthcheck", post(ws::healthcheck_handler))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind the configured address and serve until the cancellation token
    /// fires.
    ///
    /// Returns the bound address (useful with port 0) and the serve task's
    /// handle.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        let router = self.router();
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(cancel.cancelled_owned());
            if let Err(err) = serve.await {
                error!(error = %err, "server task exited with error");
            }
        });

        info!(addr = %local_addr, "bridge server listening");
        Ok((local_addr, handle))
    }

    /// Initiate graceful shutdown: stop accepting, close live plugin
    /// transports, let in-flight work finish.
    pub fn shutdown(&self) {
        info!("bridge server shutting down");
        self.broker.close_all_transports();
        self.cancel.cancel();
    }

    /// Get the session broker.
    pub fn broker(&self) -> &Arc<SessionBroker> {
        &self.broker
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get a clone of the shutdown token.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::collect(
        state.start_time,
        state.broker.connected_sessions(),
        state.broker.queued_updates(),
    ))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> String {
    crate::metrics::render(&state.metrics)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
