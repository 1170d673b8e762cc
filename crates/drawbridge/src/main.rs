//! # drawbridge
//!
//! Bridge server binary — wires config, logging, metrics, the session
//! broker, and the plugin-facing server together.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use drawbridge_broker::SessionBroker;
use drawbridge_server::config::ServerConfig;
use drawbridge_server::server::BridgeServer;

/// Session broker and plugin transport server.
#[derive(Parser, Debug)]
#[command(name = "drawbridge", about = "Session broker and plugin transport server")]
struct Cli {
    /// Host to bind (overrides config file and environment).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to a JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Default log level (`RUST_LOG` takes precedence).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines instead of the compact console format.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Fold CLI flags over the loaded configuration.
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Defaults ← config file ← DRAWBRIDGE_* env ← CLI flags.
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);

    if args.log_json {
        drawbridge_core::logging::init_json_subscriber(&args.log_level);
    } else {
        drawbridge_core::logging::init_subscriber(&args.log_level);
    }
    let metrics = drawbridge_server::metrics::install_recorder();

    let broker = Arc::new(SessionBroker::new(&config.broker_config()));
    let server = BridgeServer::new(config, broker, metrics);

    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    tracing::info!("drawbridge listening on http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server.shutdown();
    let _ = handle.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
