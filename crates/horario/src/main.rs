use std::sync::Arc;

use anyhow::{Context, Result};
use horario::config::AppConfig;
use horario::db::{KeyValueStore, MemoryStore, SqliteStore};
use horario::schedule::{FeedClient, ScheduleError, ScheduleService};
use horario::server::create_router;
use horario::types::AppState;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("horario=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting horario v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    info!("Course feed: {}", config.feed_url);

    let store: Arc<dyn KeyValueStore> = match SqliteStore::open(&config.database_path) {
        Ok(store) => {
            info!("Database path: {}", config.database_path.display());
            Arc::new(store)
        }
        Err(e) => {
            warn!(
                "Failed to open {} ({}), keeping data in memory only",
                config.database_path.display(),
                e
            );
            Arc::new(MemoryStore::new())
        }
    };

    let feed = FeedClient::new(&config).context("Failed to build the feed client")?;
    let service = ScheduleService::new(store, feed);

    match service.refresh().await {
        Ok(outcome) => info!(
            "Loaded {} courses ({} updated)",
            outcome.courses.len(),
            outcome.changes.len()
        ),
        Err(e @ ScheduleError::NoData { .. }) => {
            error!("{}; the schedule stays empty until POST /refresh succeeds", e)
        }
        Err(e) => error!("Initial fetch failed: {}", e),
    }

    let address = format!("{}:{}", config.bind_address, config.port);
    let state = Arc::new(AppState { service, config });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("horario listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
