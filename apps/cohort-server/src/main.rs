mod auth;
mod config;
mod error;
mod handlers;
mod server;
mod service;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use clap::{Parser, Subcommand};
use cohort_events::EventBus;
use cohort_events_memory::MemoryEventBus;
use cohort_store_sqlite::SqliteStore;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use config::ServerConfig;
use server::CohortServer;

// ────────────────────────────────────── CLI Types ──────────────────────────────────────

#[derive(Parser)]
#[command(name = "cohort-server")]
#[command(about = "Classroom group-set membership service")]
struct Cli {
    /// Database URL (sqlite://path/to/db.db)
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP and WebSocket server
    Serve {
        /// Server address
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },
}

// ────────────────────────────────────── Serve ──────────────────────────────────────

/// Routes plus liveness and readiness checks.
fn app(server: CohortServer, readiness: ReadinessCheck) -> Router {
    let health = Router::new()
        .route("/healthz", get(health_handler))
        .route("/readyz", get(readiness_handler))
        .with_state(readiness);

    handlers::router(server)
        .merge(health)
        .layer(TraceLayer::new_for_http())
}

async fn cmd_serve(database_url: Option<String>, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let addr: std::net::SocketAddr = addr.parse()?;
    let config = ServerConfig::from_env()?;

    let db_url = database_url.unwrap_or_else(|| "sqlite://cohort.db?mode=rwc".to_string());
    let store = SqliteStore::open(&db_url).await?;
    let events: Arc<dyn EventBus> =
        Arc::new(MemoryEventBus::with_capacity(config.event_channel_capacity));

    tracing::info!(
        database = %db_url,
        event_channel_capacity = config.event_channel_capacity,
        max_bulk_groups = config.max_bulk_groups,
        "store opened"
    );
    let server = CohortServer::new(Arc::new(store), events, config);

    let (readiness_tx, readiness_rx) = tokio::sync::watch::channel(false);
    let app = app(server, ReadinessCheck::new(readiness_rx));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "cohort-server listening");

    let _ = readiness_tx.send(true);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Some(readiness_tx)))
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

#[derive(Clone)]
struct ReadinessCheck {
    ready: tokio::sync::watch::Receiver<bool>,
}

impl ReadinessCheck {
    fn new(ready: tokio::sync::watch::Receiver<bool>) -> Self {
        Self { ready }
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn readiness_handler(
    axum::extract::State(check): axum::extract::State<ReadinessCheck>,
) -> Result<&'static str, axum::http::StatusCode> {
    if *check.ready.borrow() {
        Ok("ok")
    } else {
        Err(axum::http::StatusCode::SERVICE_UNAVAILABLE)
    }
}

async fn shutdown_signal(readiness_tx: Option<tokio::sync::watch::Sender<bool>>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("received SIGTERM, shutting down gracefully");
        }
        _ = sigint.recv() => {
            tracing::info!("received SIGINT, shutting down gracefully");
        }
    }

    // Stop advertising readiness while in-flight requests drain.
    if let Some(tx) = readiness_tx {
        let _ = tx.send(false);
    }
}

// ────────────────────────────────────── Main ──────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { addr } => {
            cmd_serve(cli.database_url, &addr).await?;
        }
    }

    Ok(())
}
