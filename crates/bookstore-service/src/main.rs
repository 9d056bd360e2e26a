//! Bookstore Service - HTTP API for purchases, stock and payments.
//!
//! This is the main entry point for the bookstore service.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookstore_ledger::{AlwaysApprove, Ledger};
use bookstore_service::{create_router, AppState, ServiceConfig};
use bookstore_store::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bookstore=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Bookstore Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = ?config.data_dir,
        admin_configured = %config.admin_api_key.is_some(),
        tx_max_attempts = config.tx_max_attempts,
        claim_lease_seconds = config.claim_lease_seconds,
        "Service configuration loaded"
    );

    let store = open_store(&config)?;
    let ledger = Ledger::new(store, Arc::new(AlwaysApprove))
        .with_max_attempts(config.tx_max_attempts)
        .with_claim_lease(Duration::from_secs(config.claim_lease_seconds));

    let state = AppState::new(ledger, config.clone());

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "rocksdb-backend")]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    if let Some(data_dir) = &config.data_dir {
        tracing::info!(path = %data_dir, "Opening RocksDB store");
        return Ok(Arc::new(bookstore_store::RocksStore::open(data_dir)?));
    }
    tracing::warn!("DATA_DIR not set, records will not survive a restart");
    Ok(Arc::new(bookstore_store::MemoryStore::new()))
}

#[cfg(not(feature = "rocksdb-backend"))]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    if config.data_dir.is_some() {
        tracing::warn!("DATA_DIR ignored: built without the rocksdb-backend feature");
    }
    tracing::info!("Using in-memory store");
    Ok(Arc::new(bookstore_store::MemoryStore::new()))
}
