//! Search Sync Main Entry Point
//!
//! This is the main binary for the storefront search-sync service. It
//! bootstraps the search indices from the owning services and then applies
//! incremental change events from the broadcast bus into OpenSearch.

use dotenv::dotenv;
use search_sync::{Dependencies, SearchSyncError};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), SearchSyncError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("search_sync=info,search_sync_repository=info"));

    let json_logs = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();

        info!(
            service_name = "search-sync",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();

        info!(
            service_name = "search-sync",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), SearchSyncError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting storefront search-sync service");

    let mut deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match deps.orchestrator.run().await {
        Ok(()) => {
            info!("Search sync completed successfully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Search sync failed");
            Err(e.into())
        }
    }
}
