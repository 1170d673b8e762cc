//! `WebSocket` session lifecycle — one connected plugin from upgrade
//! through disconnect — plus the HTTP healthcheck probe.
//!
//! The handshake carries the session identity in query parameters. Missing
//! either parameter is a fatal handshake error: the request is rejected
//! with 400 before the upgrade completes and no session state is created.

use std::time::Instant;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use drawbridge_broker::PluginLink;
use drawbridge_core::{FileId, PluginId, PluginMessage};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::server::AppState;

/// Session identity carried on the upgrade request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsParams {
    #[serde(default)]
    file_id: Option<String>,
    #[serde(default)]
    plugin_id: Option<String>,
}

/// GET /plugin/ws — upgrade to the plugin transport.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> Response {
    let file = params.file_id.filter(|v| !v.is_empty());
    let plugin = params.plugin_id.filter(|v| !v.is_empty());
    let (Some(file), Some(plugin)) = (file, plugin) else {
        warn!("websocket handshake rejected: fileId and pluginId are required");
        return (
            StatusCode::BAD_REQUEST,
            "fileId and pluginId query parameters are required",
        )
            .into_response();
    };

    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| {
            run_session(socket, FileId::from(file), PluginId::from(plugin), state)
        })
}

/// Run a `WebSocket` session for a connected plugin.
///
/// 1. Attaches the transport to the broker (flushing any queued updates)
/// 2. Forwards outbound frames and sends periodic Ping frames
/// 3. Parses inbound frames, caching variables snapshots
/// 4. Detaches on disconnect; a superseded socket's late close is a no-op
#[instrument(skip_all, fields(file = %file, plugin = %plugin))]
async fn run_session(socket: WebSocket, file: FileId, plugin: PluginId, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (send_tx, mut send_rx) = mpsc::channel::<String>(state.config.channel_capacity);
    let link = PluginLink::new(file.clone(), plugin.clone(), send_tx);

    let connected_at = Instant::now();
    info!(connection = %link.id(), "plugin connected");
    counter!("ws_connections_total").increment(1);
    gauge!("ws_connections_active").increment(1.0);

    state.broker.attach_transport(link.clone()).await;

    let ping_interval = state.config.ping_interval();
    let pong_timeout = state.config.pong_timeout();

    // Spawn outbound forwarder with periodic Ping frames.
    let outbound_link = link.clone();
    let outbound = tokio::spawn(async move {
        let mut ping = tokio::time::interval(ping_interval);
        // Skip the immediate first tick
        let _ = ping.tick().await;

        loop {
            tokio::select! {
                frame = send_rx.recv() => {
                    match frame {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping.tick() => {
                    // Check if the plugin responded to the previous ping
                    if !outbound_link.check_alive()
                        && outbound_link.last_pong_elapsed() > pong_timeout
                    {
                        warn!(
                            connection = %outbound_link.id(),
                            "plugin unresponsive for {pong_timeout:?}, disconnecting"
                        );
                        break;
                    }
                    if ws_tx.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
                () = outbound_link.closed() => {
                    // Superseded by a newer socket, or server shutdown.
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    // Process incoming frames until the plugin goes away.
    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => handle_frame(&state, &link, text.as_str()).await,
            Message::Binary(data) => match std::str::from_utf8(&data) {
                Ok(text) => handle_frame(&state, &link, text).await,
                Err(_) => {
                    debug!(connection = %link.id(), len = data.len(), "ignoring non-UTF8 binary frame");
                }
            },
            Message::Ping(_) | Message::Pong(_) => link.mark_alive(),
            Message::Close(_) => {
                info!(connection = %link.id(), "plugin sent close frame");
                break;
            }
        }
    }

    // Clean up
    info!(connection = %link.id(), "plugin disconnected");
    counter!("ws_disconnections_total").increment(1);
    gauge!("ws_connections_active").decrement(1.0);
    histogram!("ws_session_duration_seconds").record(connected_at.elapsed().as_secs_f64());
    outbound.abort();
    state.broker.detach_transport(&link).await;
}

/// Parse one inbound text frame.
///
/// Only messages the broker consumes are recognized; anything else is
/// logged at debug and dropped so junk can never crash the session loop.
async fn handle_frame(state: &AppState, link: &PluginLink, text: &str) {
    link.mark_alive();
    match serde_json::from_str::<PluginMessage>(text) {
        Ok(PluginMessage::VariablesResponse {
            variables,
            collections,
        }) => {
            state.broker.ingest_snapshot(link, variables, collections).await;
        }
        Err(_) => {
            debug!(connection = %link.id(), "ignoring unrecognized inbound message");
        }
    }
}

/// Healthcheck probe body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthcheckBody {
    #[serde(default)]
    plugin_id: Option<String>,
    #[serde(default)]
    file_id: Option<String>,
}

/// POST /plugin/healthcheck — liveness probe for plugins without a socket.
pub async fn healthcheck_handler(
    State(state): State<AppState>,
    Json(body): Json<HealthcheckBody>,
) -> Response {
    let plugin = body.plugin_id.filter(|v| !v.is_empty());
    let file = body.file_id.filter(|v| !v.is_empty());
    let (Some(plugin), Some(file)) = (plugin, file) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "pluginId and fileId are required" })),
        )
            .into_response();
    };

    state
        .broker
        .heartbeat(&FileId::from(file), &PluginId::from(plugin))
        .await;
    Json(json!({ "success": true })).into_response()
}
