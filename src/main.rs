use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use jobquest_api::config::AppConfig;
use jobquest_api::database::{DocumentStore, MemoryStore, PgStore};
use jobquest_api::{app, AppState};

#[derive(Parser, Debug)]
#[command(name = "jobquest-api", version, about = "Job board REST API")]
struct Args {
    /// Listen port; overrides PORT
    #[arg(long)]
    port: Option<u16>,

    /// Keep documents in process memory instead of PostgreSQL
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, ACCESS_TOKEN_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    tracing::info!("Starting JobQuest API in {:?} mode", config.environment);

    let mut pg = None;
    let store: Arc<dyn DocumentStore> = if args.in_memory {
        tracing::warn!("Using in-memory store; documents are lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let store = PgStore::connect(&config.database)
            .await
            .context("failed to connect to PostgreSQL")?;
        store.migrate().await.context("failed to create collections")?;
        let store = Arc::new(store);
        pg = Some(store.clone());
        store
    };

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store).context("invalid token configuration")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("JobQuest API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(store) = pg {
        store.close().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
