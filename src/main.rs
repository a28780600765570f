//! Keel Binary Entry Point
//!
//! Composes the optional data layer with the HTTP server. The listener binds
//! immediately; schema initialization runs as a supervised background task
//! and its failure never prevents the process from serving.

use clap::Parser;
use keel::{
    config::{DatabaseConfig, ServerConfig},
    db::{DbRuntime, RetryPolicy},
    server::{AppState, create_router},
};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Keel - Generated API Backend
#[derive(Parser, Debug)]
#[command(name = "keel", version, about, long_about = None)]
struct Cli {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0", env = "KEEL_BIND")]
    bind: String,

    /// Server port
    #[arg(long, default_value_t = 8000, env = "PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,keel=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let server = ServerConfig {
        bind: cli.bind,
        port: cli.port,
    };

    // Capability is decided here, once: either one adapter variant was baked
    // into this build, or the host runs in-memory-only.
    let database = DatabaseConfig::from_env()?;
    match &database {
        Some(cfg) => tracing::info!(engine = cfg.engine_name(), "database addon configured"),
        None => tracing::info!("no database addon configured, running in-memory-only"),
    }

    let db = DbRuntime::from_config(database.as_ref());

    // Supervised startup task: retries until the database is ready or the
    // budget is exhausted, without blocking the listener below.
    db.spawn_initialize(RetryPolicy::default());

    let app = create_router(AppState { db });

    let addr: SocketAddr = format!("{}:{}", server.bind, server.port).parse()?;
    tracing::info!("API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
