//! credgate API Server
//!
//! Options:
//! - `--config` / `CREDGATE_CONFIG`: optional TOML file, overridden by the variables below
//! - `--memory` / `CREDGATE_MEMORY_STORE=true`: keep identities in memory instead of PostgreSQL
//! - `DATABASE_URL`, `JWT_SECRET`, `JWT_ACCESS_TTL_MINUTES`, `API_HOST`, `API_PORT`

use anyhow::Context;
use clap::Parser;
use credgate_api::{create_router, state::AppState, telemetry::init_tracing};
use credgate_core::config::AppConfig;
use credgate_core::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "credgate-api")]
#[command(about = "credgate HTTP server")]
#[command(version)]
struct Args {
    /// TOML configuration file (environment variables still override it)
    #[arg(long, env = "CREDGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Use an in-memory credential store instead of PostgreSQL
    #[arg(long, env = "CREDGATE_MEMORY_STORE")]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = match args.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };

    init_tracing(&config.logging);
    config.validate()?;

    let store: Arc<dyn CredentialStore> = if args.memory {
        tracing::warn!("Using in-memory credential store; identities are lost on exit");
        Arc::new(MemoryCredentialStore::new())
    } else {
        let store = PgCredentialStore::connect(&config.database)
            .await
            .context("Failed to connect to the credential store")?;
        store.ensure_schema().await?;
        Arc::new(store)
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let state = Arc::new(AppState::new(config, store));

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("credgate API Server starting on http://{}", addr);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("credgate API Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
