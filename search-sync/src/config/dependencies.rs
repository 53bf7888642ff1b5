//! Dependency initialization and wiring for the search-sync service.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use url::Url;

use crate::bus::ChannelBus;
use crate::orchestrator::Orchestrator;
use crate::source::{HttpSnapshotSource, DEFAULT_SNAPSHOT_TIMEOUT_SECS};
use crate::SearchSyncError;
use search_sync_repository::{OpenSearchProvider, SearchIndexProvider};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default base URLs for the owning services.
const DEFAULT_CATALOG_URL: &str = "http://localhost:8081";
const DEFAULT_ACCOUNTS_URL: &str = "http://localhost:8082";
const DEFAULT_BILLING_URL: &str = "http://localhost:8083";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection on an interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse connection mode from environment variable.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive)
    /// Defaults to "retry" if not set or invalid.
    fn from_env() -> Self {
        match env::var("OPENSEARCH_CONNECTION_MODE")
            .unwrap_or_else(|_| "retry".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    /// The broadcast bus; owning services hang their publishers off this.
    pub bus: Arc<ChannelBus>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `CATALOG_SERVICE_URL`: Catalog service base URL (default: http://localhost:8081)
    /// - `ACCOUNTS_SERVICE_URL`: Accounts service base URL (default: http://localhost:8082)
    /// - `BILLING_SERVICE_URL`: Billing service base URL (default: http://localhost:8083)
    /// - `SNAPSHOT_TIMEOUT_SECS`: Snapshot fetch timeout in seconds (default: 60)
    /// - `CHANNEL_CAPACITY`: Per-channel broadcast buffer size (default: 256)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(SearchSyncError)` - If initialization fails (only in fail-fast mode)
    pub async fn new() -> Result<Self, SearchSyncError> {
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let connection_mode = ConnectionMode::from_env();
        let retry_interval = env::var("OPENSEARCH_RETRY_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);
        let snapshot_timeout = env::var("SNAPSHOT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SNAPSHOT_TIMEOUT_SECS);

        info!(
            opensearch_url = %opensearch_url,
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval,
            snapshot_timeout_secs = snapshot_timeout,
            "Initializing dependencies"
        );

        let provider = Self::connect_to_opensearch(
            &opensearch_url,
            connection_mode,
            Duration::from_secs(retry_interval),
        )
        .await?;
        info!("OpenSearch connection established");

        let catalog_url = Self::service_url("CATALOG_SERVICE_URL", DEFAULT_CATALOG_URL)?;
        let accounts_url = Self::service_url("ACCOUNTS_SERVICE_URL", DEFAULT_ACCOUNTS_URL)?;
        let billing_url = Self::service_url("BILLING_SERVICE_URL", DEFAULT_BILLING_URL)?;

        let source = HttpSnapshotSource::new(
            catalog_url,
            accounts_url,
            billing_url,
            Duration::from_secs(snapshot_timeout),
        )
        .map_err(|e| SearchSyncError::config(format!("Failed to create snapshot source: {}", e)))?;

        let bus = match env::var("CHANNEL_CAPACITY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            Some(capacity) => Arc::new(ChannelBus::with_capacity(capacity)),
            None => Arc::new(ChannelBus::new()),
        };

        let orchestrator = Orchestrator::new(bus.clone(), Arc::new(provider), Arc::new(source));

        Ok(Self { orchestrator, bus })
    }

    fn service_url(var: &str, default: &str) -> Result<Url, SearchSyncError> {
        let raw = env::var(var).unwrap_or_else(|_| default.to_string());
        Url::parse(&raw)
            .map_err(|e| SearchSyncError::config(format!("Invalid {}: {}: {}", var, raw, e)))
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, SearchSyncError> {
        loop {
            match Self::try_connect_opensearch(url).await {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(SearchSyncError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Attempt to connect and verify the cluster answers a ping.
    async fn try_connect_opensearch(url: &str) -> Result<OpenSearchProvider, SearchSyncError> {
        let provider = OpenSearchProvider::new(url).map_err(|e| {
            SearchSyncError::config(format!("Failed to create OpenSearch provider: {}", e))
        })?;
        provider
            .ping()
            .await
            .map_err(|e| SearchSyncError::config(format!("OpenSearch ping failed: {}", e)))?;
        Ok(provider)
    }
}
