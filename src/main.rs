//! canvasd - real-time collaboration hub for the spaces-and-cards canvas.
//!
//! Authenticated clients hold a WebSocket open, join a space, and exchange
//! presence, card locks/selections, and mutation events. The hub keeps the
//! authoritative in-memory state and fans every event out to the rest of
//! the space.

mod config;
mod db;
mod error;
mod handlers;
mod metrics;
mod network;
mod security;
mod state;

use crate::config::Config;
use crate::db::Database;
use crate::handlers::Registry;
use crate::network::{Gateway, spawn_liveness_monitor};
use crate::state::Hub;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Resolve the configuration path from CLI arguments.
/// Supports `-c <path>`, `--config <path>`, or a bare path.
/// Falls back to `config.toml` when no argument is provided.
fn resolve_config_path() -> String {
    let mut args = std::env::args().skip(1);

    let raw_path = match args.next() {
        Some(flag) if flag == "-c" || flag == "--config" => args.next().unwrap_or_else(|| {
            eprintln!("Missing path after {}", flag);
            std::process::exit(1);
        }),
        Some(path) => path,
        None => "config.toml".to_string(),
    };

    match std::fs::canonicalize(Path::new(&raw_path)) {
        Ok(p) => p.to_string_lossy().into_owned(),
        Err(_) => raw_path,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (before tracing, so we can use log_format)
    let config_path = resolve_config_path();

    let config = Config::load(&config_path).map_err(|e| {
        eprintln!("ERROR: Failed to load config from {}: {}", config_path, e);
        e
    })?;

    // Initialize tracing based on config
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match config.server.log_format {
        config::LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .json()
                .init();
        }
        config::LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .init();
        }
    }

    // Validate configuration
    if let Err(errors) = config::validate(&config) {
        for err in &errors {
            error!(error = %err, "Configuration validation failed");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s)",
            errors.len()
        ));
    }

    info!(listen = %config.server.listen, "Starting canvasd");

    // Refuse to start with a default/weak token secret: every credential on
    // the wire is verified against it.
    if security::token::is_default_secret(&config.auth.token_secret) {
        if std::env::var("CANVASD_ALLOW_INSECURE_SECRET").is_ok() {
            tracing::warn!(
                "INSECURE: Running with weak token_secret (allowed via CANVASD_ALLOW_INSECURE_SECRET)"
            );
        } else {
            error!("FATAL: Insecure token_secret detected!");
            error!("  The token_secret validates every client credential.");
            error!("  Set a strong secret in config.toml:");
            error!("    [auth]");
            error!("    token_secret = \"<random-32-char-string>\"");
            error!("  Generate one with: openssl rand -hex 32");
            error!("  For testing only, set CANVASD_ALLOW_INSECURE_SECRET=1 to bypass this check.");
            return Err(anyhow::anyhow!(
                "Refusing to start with insecure token_secret. See error messages above."
            ));
        }
    }

    // Initialize database (read-side of the admin surface's tables)
    let db = Database::new(&config.database.path).await?;

    // Disconnect worker: the liveness monitor requests disconnects without
    // blocking. Bounded channel with backpressure to prevent memory
    // exhaustion from disconnect storms.
    const DISCONNECT_CHANNEL_SIZE: usize = 1024;
    let (disconnect_tx, mut disconnect_rx) =
        tokio::sync::mpsc::channel::<state::DisconnectRequest>(DISCONNECT_CHANNEL_SIZE);

    let hub = Arc::new(Hub::new(&config, db, disconnect_tx));
    info!("Hub initialized");

    // Spawn signal handler for graceful shutdown
    {
        let shutdown_tx = hub.lifecycle.shutdown_tx.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigint =
                signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = sigint.recv() => info!("Received SIGINT - initiating graceful shutdown"),
                _ = sigterm.recv() => info!("Received SIGTERM - initiating graceful shutdown"),
            }

            // Broadcast shutdown signal to all tasks
            let _ = shutdown_tx.send(());
        });
    }

    // Process disconnect requests outside the monitor task to avoid
    // stalling the tick while broadcasts drain.
    {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            while let Some(request) = disconnect_rx.recv().await {
                hub.disconnect_session(request.session_id, &request.reason);
            }
        });
    }

    // Start the heartbeat-driven liveness monitor
    spawn_liveness_monitor(Arc::clone(&hub));
    info!(
        interval_secs = config.server.heartbeat_interval_secs,
        "Liveness monitor started"
    );

    // Prometheus metrics are optional.
    // Convention: metrics_port = 0 disables the HTTP endpoint (used by tests).
    let metrics_port = config.server.metrics_port.unwrap_or(9090);
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        tokio::spawn(async move {
            if let Err(e) = metrics::serve(metrics_port).await {
                error!(error = %e, "Metrics endpoint failed");
            }
        });
        info!(port = metrics_port, "Prometheus scrape endpoint started");
    }

    // Create frame handler registry
    let registry = Arc::new(Registry::new());

    // Start the Gateway
    let gateway = Gateway::bind(config.server.listen, Arc::clone(&hub), registry).await?;
    gateway.run().await?;

    info!("Gateway stopped, waiting for tasks to finish...");
    // Give tasks a moment to flush buffers and close connections
    tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;

    Ok(())
}
