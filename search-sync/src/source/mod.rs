//! Snapshot source for the one-time bootstrap load.
//!
//! The bootstrap indexer pulls the complete current dataset from each owning
//! service through this trait. The fetch is all-or-nothing from the caller's
//! point of view: either the full list of denormalized documents comes back
//! or the bootstrap fails. Records created after the fetch returns are not
//! covered; they arrive (or are lost) through the incremental channels.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::errors::SyncError;
use search_sync_shared::{DocumentKind, InvoiceDocument, ProductDocument, UserDocument};

/// Default snapshot request timeout in seconds.
pub const DEFAULT_SNAPSHOT_TIMEOUT_SECS: u64 = 60;

/// Authoritative dataset source, one fetch per document kind.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch every product currently in the catalog service.
    async fn fetch_products(&self) -> Result<Vec<ProductDocument>, SyncError>;

    /// Fetch every user currently in the accounts service.
    async fn fetch_users(&self) -> Result<Vec<UserDocument>, SyncError>;

    /// Fetch every invoice currently in the billing service.
    async fn fetch_invoices(&self) -> Result<Vec<InvoiceDocument>, SyncError>;
}

/// HTTP snapshot source.
///
/// Each owning service exposes its full denormalized dataset at
/// `GET {base}/internal/search-export`; the response is a JSON array of
/// documents in the index shape.
pub struct HttpSnapshotSource {
    client: reqwest::Client,
    catalog_url: Url,
    accounts_url: Url,
    billing_url: Url,
}

impl HttpSnapshotSource {
    /// Create an HTTP snapshot source with per-request timeout.
    ///
    /// # Arguments
    ///
    /// * `catalog_url` - Base URL of the catalog service
    /// * `accounts_url` - Base URL of the accounts service
    /// * `billing_url` - Base URL of the billing service
    /// * `timeout` - Upper bound on one snapshot fetch
    pub fn new(
        catalog_url: Url,
        accounts_url: Url,
        billing_url: Url,
        timeout: Duration,
    ) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::snapshot(e.to_string()))?;

        info!(
            catalog_url = %catalog_url,
            accounts_url = %accounts_url,
            billing_url = %billing_url,
            timeout_secs = timeout.as_secs(),
            "Created HTTP snapshot source"
        );

        Ok(Self {
            client,
            catalog_url,
            accounts_url,
            billing_url,
        })
    }

    fn export_url(&self, kind: DocumentKind) -> Result<Url, SyncError> {
        let base = match kind {
            DocumentKind::Product => &self.catalog_url,
            DocumentKind::User => &self.accounts_url,
            DocumentKind::Invoice => &self.billing_url,
        };
        base.join("internal/search-export")
            .map_err(|e| SyncError::snapshot(e.to_string()))
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        kind: DocumentKind,
    ) -> Result<Vec<T>, SyncError> {
        let url = self.export_url(kind)?;
        debug!(kind = %kind, url = %url, "Fetching snapshot");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SyncError::snapshot(format!("{} snapshot fetch failed: {}", kind, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::snapshot(format!(
                "{} snapshot fetch returned status {}",
                kind, status
            )));
        }

        let records: Vec<T> = response
            .json()
            .await
            .map_err(|e| SyncError::snapshot(format!("{} snapshot decode failed: {}", kind, e)))?;

        info!(kind = %kind, record_count = records.len(), "Fetched snapshot");
        Ok(records)
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch_products(&self) -> Result<Vec<ProductDocument>, SyncError> {
        self.fetch(DocumentKind::Product).await
    }

    async fn fetch_users(&self) -> Result<Vec<UserDocument>, SyncError> {
        self.fetch(DocumentKind::User).await
    }

    async fn fetch_invoices(&self) -> Result<Vec<InvoiceDocument>, SyncError> {
        self.fetch(DocumentKind::Invoice).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_url_per_kind() {
        let source = HttpSnapshotSource::new(
            Url::parse("http://catalog:8080/").unwrap(),
            Url::parse("http://accounts:8080/").unwrap(),
            Url::parse("http://billing:8080/").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(
            source.export_url(DocumentKind::Product).unwrap().as_str(),
            "http://catalog:8080/internal/search-export"
        );
        assert_eq!(
            source.export_url(DocumentKind::Invoice).unwrap().as_str(),
            "http://billing:8080/internal/search-export"
        );
    }
}
