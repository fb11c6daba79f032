//! Service binary for the sensorhub telemetry pipeline.
//!
//! Wires the ingestion controller, the PostgreSQL reading store, the
//! broadcast hub, and the observer API into one process.
//!
//! # Architecture
//!
//! ```text
//! NATS (readings topic) --> IngestController --> PostgreSQL --> BroadcastHub --> WebSocket observers
//!                                                     ^
//!                                     REST /api/readings (query facade)
//! ```
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from environment variables
//! 3. Connect to `PostgreSQL` and run migrations (the only fatal step)
//! 4. Start the ingestion controller task
//! 5. Serve the observer API until Ctrl-C
//!
//! The broker being down at startup is not fatal: the controller retries
//! with backoff for as long as the process lives.

mod config;

use std::sync::Arc;

use sensorhub_db::{PgReadingStore, PostgresPool};
use sensorhub_ingest::{
    BroadcastHub, ControllerConfig, IngestController, NatsTransport, ReadingStore,
};
use sensorhub_observer::{AppState, ServerConfig, start_server};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the database is
/// unreachable at startup, or the observer server fails to bind.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("sensorhub-server starting");

    // 2. Load configuration.
    let config = AppConfig::from_env()?;
    info!(
        broker_url = config.broker_url,
        broker_topic = config.broker_topic,
        http_host = config.http_host,
        http_port = config.http_port,
        "configuration loaded"
    );

    // 3. Connect to PostgreSQL. Initial storage connectivity is the only
    // condition the service treats as fatal.
    let pool = PostgresPool::connect_url(&config.database_url).await?;
    pool.run_migrations().await?;
    let store: Arc<dyn ReadingStore> = Arc::new(PgReadingStore::new(&pool));

    // 4. Start the ingestion controller.
    let hub = BroadcastHub::new();
    let transport = NatsTransport::new(config.broker_url.clone());
    let controller = IngestController::new(
        transport,
        Arc::clone(&store),
        hub.clone(),
        ControllerConfig {
            topic: config.broker_topic.clone(),
            initial_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
        },
    );
    let shutdown = controller.shutdown_token();
    let ingest_task = tokio::spawn(controller.run());
    info!("ingestion controller started");

    // Ctrl-C requests a cooperative shutdown of both halves.
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_token.cancel();
        }
    });

    // 5. Serve the observer API until shutdown.
    let state = Arc::new(AppState::new(hub, store));
    let server_config = ServerConfig {
        host: config.http_host.clone(),
        port: config.http_port,
    };
    start_server(&server_config, state, shutdown.clone()).await?;

    // The server stopped; make sure the pipeline unwinds too, then let it
    // finish its best-effort unsubscribe.
    shutdown.cancel();
    if let Err(e) = ingest_task.await {
        warn!(error = %e, "ingestion task did not shut down cleanly");
    }
    pool.close().await;

    info!("sensorhub-server stopped");
    Ok(())
}
