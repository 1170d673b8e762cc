//! # drawbridge-server
//!
//! Axum HTTP + `WebSocket` server hosting the plugin transport.
//!
//! - `GET /plugin/ws` — plugin transport upgrade (query `fileId`, `pluginId`)
//! - `POST /plugin/healthcheck` — liveness probe for plugins without a socket
//! - `GET /health` — process status plus live broker counters
//! - `GET /metrics` — Prometheus exposition
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod ws;

pub use config::ServerConfig;
pub use server::BridgeServer;
