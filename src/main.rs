// Initialize configuration
// Set up logging
// Create database connection pool
// Create shared state (catalog, sync driver, history reader)
// Start scheduled sync task
// Start HTTP server

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallet_history_service::{api, config::Config, db, feed::DebankClient, state::AppState, sync};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting wallet-history-service");

    // Load configuration
    let config = Config::from_env();
    if config.feed_access_key.is_none() {
        tracing::warn!("FEED_ACCESS_KEY is not set, upstream requests will be unauthenticated");
    }

    // Setup database connection
    let db_pool = db::connection::establish_connection(&config.database_url).await?;
    tracing::info!("Database connection established");

    let shutdown = CancellationToken::new();
    let feed = Arc::new(DebankClient::new(&config)?);
    let app_state = Arc::new(AppState::new(config, db_pool, feed, shutdown.clone()));
    let config = &app_state.config;

    // Start scheduled sync task
    let sync_handle = tokio::spawn(sync::start_scheduled_sync(
        app_state.sync.clone(),
        config.tracked_addresses.clone(),
        config.sync_interval,
        config.sync_on_startup,
        shutdown.clone(),
    ));

    // Start HTTP server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let app = api::create_router(app_state.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Starting server on {}", addr);

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    let _ = sync_handle.await;

    Ok(())
}
