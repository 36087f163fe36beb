//! warden-server - The warden state store service
//!
//! Serves the client registry over HTTP: agents poll their desired state
//! here, operators flip it.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use warden_server::{AppState, router};
use warden_store::ClientRegistry;

/// warden-server - Central desired-state registry for warden agents
#[derive(Parser, Debug)]
#[command(name = "warden-server")]
#[command(about = "Central desired-state registry for warden agents", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "WARDEN_LISTEN", default_value = "0.0.0.0:8000")]
    listen: SocketAddr,

    /// Registry file path
    #[arg(short, long, env = "WARDEN_DATA_FILE", default_value = "client_configs.json")]
    data_file: PathBuf,

    /// Log level
    #[arg(short, long, env = "WARDEN_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "warden-server starting");

    let registry = ClientRegistry::open(&args.data_file)
        .with_context(|| format!("Failed to open registry {:?}", args.data_file))?;
    let state = Arc::new(AppState::new(registry));

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    info!(
        listen = %args.listen,
        data_file = %args.data_file.display(),
        clients = state.registry.len(),
        "Serving"
    );

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
            _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
        }
    };

    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    // A mutation whose save failed may still sit only in memory.
    if let Err(e) = state.registry.save() {
        warn!(error = %e, "Final registry save failed");
    }
    info!(clients = state.registry.len(), "Shutdown complete");
    Ok(())
}
