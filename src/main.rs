//! tour-tracker server entry point.
//!
//! Starts the Axum HTTP server with the execution REST endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use tour_tracker::api;
use tour_tracker::api::auth::TokenVerifier;
use tour_tracker::app_state::AppState;
use tour_tracker::config::{LogFormat, TrackerConfig};
use tour_tracker::persistence::{
    ExecutionRepository, InMemoryRepository, PostgresRepository, SeedData,
};
use tour_tracker::service::ExecutionService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = TrackerConfig::from_env()?;
    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting tour-tracker");

    // Build persistence layer
    let repository = build_repository(&config).await?;

    // Build service layer
    let execution_service = Arc::new(ExecutionService::new(repository, config.request_timeout));

    // Build application state
    let app_state = AppState {
        execution_service,
        token_verifier: Arc::new(TokenVerifier::new(&config.jwt_secret)),
    };

    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn build_repository(config: &TrackerConfig) -> anyhow::Result<Arc<dyn ExecutionRepository>> {
    if let Some(url) = config.postgres_url() {
        tracing::info!(
            max_connections = config.database_max_connections,
            "using postgres persistence"
        );
        let repository = PostgresRepository::connect(config)
            .await
            .with_context(|| format!("connecting to {}", redact(url)))?;
        return Ok(Arc::new(repository));
    }

    tracing::warn!("DATABASE_URL not set, executions are kept in memory only");
    let repository = InMemoryRepository::new();
    if let Some(path) = &config.seed_path {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading seed file {}", path.display()))?;
        let seed: SeedData = serde_json::from_str(&raw)
            .with_context(|| format!("parsing seed file {}", path.display()))?;
        tracing::info!(
            tours = seed.tours.len(),
            key_points = seed.key_points.len(),
            "loading seed data"
        );
        repository.load_seed(seed).await?;
    }
    Ok(Arc::new(repository))
}

/// Strips credentials from a connection URL before it is logged.
fn redact(url: &str) -> &str {
    url.rsplit_once('@').map_or(url, |(_, host)| host)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
