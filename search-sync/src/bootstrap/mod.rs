//! Bootstrap indexer: the one-time full load of an index.
//!
//! Runs once at startup of the index-owning process. An index that already
//! exists is an anomaly, not a no-op: this function is defined to run at
//! most once successfully per index lifetime, so a second call reports an
//! error and touches nothing. The only sanctioned way back is the explicit
//! destructive [`BootstrapIndexer::resync`].

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::errors::SyncError;
use crate::source::SnapshotSource;
use search_sync_repository::SearchIndexProvider;
use search_sync_shared::DocumentKind;

/// Outcome of one successful bootstrap load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Number of documents loaded into the index.
    pub indexed: usize,
}

/// Loads each index once from its authoritative service.
pub struct BootstrapIndexer {
    provider: Arc<dyn SearchIndexProvider>,
    source: Arc<dyn SnapshotSource>,
}

impl BootstrapIndexer {
    /// Create a bootstrap indexer over the given provider and source.
    pub fn new(provider: Arc<dyn SearchIndexProvider>, source: Arc<dyn SnapshotSource>) -> Self {
        Self { provider, source }
    }

    /// Run the bootstrap for one kind.
    ///
    /// 1. If the index already exists, report an error and take no action.
    /// 2. Fetch the complete dataset from the owning service (all-or-nothing).
    /// 3. Create the index with the kind's fixed field mapping.
    /// 4. Bulk-write every record keyed by its stable id; item failures are
    ///    logged and collected without aborting the batch.
    /// 5. Report one aggregate error if anything failed, success otherwise.
    ///
    /// On success every record present in the fetched dataset is indexed
    /// exactly once. Records created after the fetch are not covered.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn run(&self, kind: DocumentKind) -> Result<BootstrapReport, SyncError> {
        if self.provider.index_exists(kind).await? {
            error!(index = kind.index_name(), "Index already exists after first sync");
            return Err(SyncError::IndexAlreadyExists(kind.index_name()));
        }

        let documents = self.fetch_dataset(kind).await?;
        info!(
            kind = %kind,
            record_count = documents.len(),
            "Fetched authoritative dataset, creating index"
        );

        self.provider.create_index(kind).await?;

        let summary = self.provider.bulk_index(kind, &documents).await?;
        if summary.has_failures() {
            for failure in &summary.failures {
                error!(
                    kind = %kind,
                    doc_id = %failure.id,
                    error = %failure.error,
                    "Document failed during bootstrap load"
                );
            }
            return Err(SyncError::bulk_load(format!(
                "{} of {} {} documents failed during bootstrap",
                summary.failed(),
                summary.total,
                kind
            )));
        }

        info!(kind = %kind, indexed = summary.succeeded, "Bootstrap load complete");
        Ok(BootstrapReport {
            indexed: summary.succeeded,
        })
    }

    /// Run the bootstrap for every kind, in order. Stops at the first error.
    pub async fn run_all(&self) -> Result<(), SyncError> {
        for kind in DocumentKind::ALL {
            self.run(kind).await?;
        }
        Ok(())
    }

    /// Destructive resync: tear the index down and rebuild it from the
    /// relational source. This is the manual recovery path for lost
    /// deliveries; it is never triggered automatically.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn resync(&self, kind: DocumentKind) -> Result<BootstrapReport, SyncError> {
        if self.provider.index_exists(kind).await? {
            warn!(
                index = kind.index_name(),
                "Destructive resync requested, deleting existing index"
            );
            self.provider.delete_index(kind).await?;
        }
        self.run(kind).await
    }

    /// Fetch and serialize the full dataset as `(stable id, document)` pairs.
    async fn fetch_dataset(
        &self,
        kind: DocumentKind,
    ) -> Result<Vec<(String, serde_json::Value)>, SyncError> {
        fn to_pairs<T: Serialize>(
            records: Vec<T>,
            id_of: impl Fn(&T) -> String,
        ) -> Result<Vec<(String, serde_json::Value)>, SyncError> {
            records
                .into_iter()
                .map(|record| {
                    let id = id_of(&record);
                    let value = serde_json::to_value(&record)
                        .map_err(|e| SyncError::snapshot(e.to_string()))?;
                    Ok((id, value))
                })
                .collect()
        }

        match kind {
            DocumentKind::Product => {
                to_pairs(self.source.fetch_products().await?, |d| d.id.clone())
            }
            DocumentKind::User => to_pairs(self.source.fetch_users().await?, |d| d.id.clone()),
            DocumentKind::Invoice => {
                to_pairs(self.source.fetch_invoices().await?, |d| d.id.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use search_sync_repository::{BulkItemFailure, BulkWriteSummary, SearchIndexError, SearchPage};
    use search_sync_shared::{
        HistogramQuery, HistogramResponse, IndexQuery, InvoiceDocument, ProductDocument,
        UserDocument,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory provider recording index state per kind.
    struct MockProvider {
        indexes: Mutex<HashMap<&'static str, HashMap<String, serde_json::Value>>>,
        create_calls: AtomicUsize,
        bulk_calls: AtomicUsize,
        failing_ids: Vec<String>,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                indexes: Mutex::new(HashMap::new()),
                create_calls: AtomicUsize::new(0),
                bulk_calls: AtomicUsize::new(0),
                failing_ids: Vec::new(),
            }
        }

        fn failing_on(ids: &[&str]) -> Self {
            Self {
                failing_ids: ids.iter().map(|s| s.to_string()).collect(),
                ..Self::new()
            }
        }

        fn document_count(&self, kind: DocumentKind) -> usize {
            self.indexes
                .lock()
                .unwrap()
                .get(kind.index_name())
                .map(|m| m.len())
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl SearchIndexProvider for MockProvider {
        async fn ping(&self) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn index_exists(&self, kind: DocumentKind) -> Result<bool, SearchIndexError> {
            Ok(self.indexes.lock().unwrap().contains_key(kind.index_name()))
        }

        async fn create_index(&self, kind: DocumentKind) -> Result<(), SearchIndexError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.indexes
                .lock()
                .unwrap()
                .insert(kind.index_name(), HashMap::new());
            Ok(())
        }

        async fn delete_index(&self, kind: DocumentKind) -> Result<(), SearchIndexError> {
            self.indexes.lock().unwrap().remove(kind.index_name());
            Ok(())
        }

        async fn bulk_index(
            &self,
            kind: DocumentKind,
            documents: &[(String, serde_json::Value)],
        ) -> Result<BulkWriteSummary, SearchIndexError> {
            self.bulk_calls.fetch_add(1, Ordering::SeqCst);
            let mut indexes = self.indexes.lock().unwrap();
            let index = indexes.entry(kind.index_name()).or_default();

            let mut failures = Vec::new();
            for (id, document) in documents {
                if self.failing_ids.contains(id) {
                    failures.push(BulkItemFailure {
                        id: id.clone(),
                        error: "simulated item failure".to_string(),
                    });
                } else {
                    index.insert(id.clone(), document.clone());
                }
            }

            let failed = failures.len();
            Ok(BulkWriteSummary {
                total: documents.len(),
                succeeded: documents.len() - failed,
                failures,
            })
        }

        async fn upsert_document(
            &self,
            kind: DocumentKind,
            id: &str,
            document: &serde_json::Value,
        ) -> Result<(), SearchIndexError> {
            self.indexes
                .lock()
                .unwrap()
                .entry(kind.index_name())
                .or_default()
                .insert(id.to_string(), document.clone());
            Ok(())
        }

        async fn delete_document(
            &self,
            kind: DocumentKind,
            id: &str,
        ) -> Result<(), SearchIndexError> {
            if let Some(index) = self.indexes.lock().unwrap().get_mut(kind.index_name()) {
                index.remove(id);
            }
            Ok(())
        }

        async fn search(
            &self,
            _kind: DocumentKind,
            _query: &IndexQuery,
        ) -> Result<SearchPage, SearchIndexError> {
            Ok(SearchPage { hits: vec![] })
        }

        async fn aggregate(
            &self,
            _kind: DocumentKind,
            _query: &HistogramQuery,
        ) -> Result<HistogramResponse, SearchIndexError> {
            Ok(HistogramResponse {
                buckets: vec![],
                average: 0.0,
            })
        }
    }

    struct MockSource {
        products: Vec<ProductDocument>,
    }

    impl MockSource {
        fn with_products(count: usize) -> Self {
            let products = (0..count)
                .map(|i| ProductDocument {
                    id: i.to_string(),
                    name: format!("Product {i}"),
                    description: None,
                    sku: format!("SKU-{i}"),
                    category_name: "General".to_string(),
                    brand_name: "Acme".to_string(),
                    price_cents: 1000 + i as i64,
                    status: "active".to_string(),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                })
                .collect();
            Self { products }
        }
    }

    #[async_trait]
    impl SnapshotSource for MockSource {
        async fn fetch_products(&self) -> Result<Vec<ProductDocument>, SyncError> {
            Ok(self.products.clone())
        }

        async fn fetch_users(&self) -> Result<Vec<UserDocument>, SyncError> {
            Ok(vec![])
        }

        async fn fetch_invoices(&self) -> Result<Vec<InvoiceDocument>, SyncError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_bootstrap_loads_every_record_once() {
        let provider = Arc::new(MockProvider::new());
        let source = Arc::new(MockSource::with_products(5));
        let bootstrap = BootstrapIndexer::new(provider.clone(), source);

        let report = bootstrap.run(DocumentKind::Product).await.unwrap();

        assert_eq!(report.indexed, 5);
        assert_eq!(provider.document_count(DocumentKind::Product), 5);
        assert_eq!(provider.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_bootstrap_is_error_and_no_op() {
        let provider = Arc::new(MockProvider::new());
        let source = Arc::new(MockSource::with_products(3));
        let bootstrap = BootstrapIndexer::new(provider.clone(), source);

        bootstrap.run(DocumentKind::Product).await.unwrap();
        let second = bootstrap.run(DocumentKind::Product).await;

        assert!(matches!(second, Err(SyncError::IndexAlreadyExists(_))));
        // The second call performed no writes at all.
        assert_eq!(provider.document_count(DocumentKind::Product), 3);
        assert_eq!(provider.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.bulk_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_item_failures_aggregate_without_aborting_batch() {
        let provider = Arc::new(MockProvider::failing_on(&["1", "3"]));
        let source = Arc::new(MockSource::with_products(5));
        let bootstrap = BootstrapIndexer::new(provider.clone(), source);

        let result = bootstrap.run(DocumentKind::Product).await;

        let err = result.unwrap_err();
        assert!(matches!(err, SyncError::BulkLoadError(_)));
        assert!(err.to_string().contains("2 of 5"));
        // Sibling items were still written.
        assert_eq!(provider.document_count(DocumentKind::Product), 3);
    }

    #[tokio::test]
    async fn test_empty_dataset_bootstrap_succeeds() {
        let provider = Arc::new(MockProvider::new());
        let source = Arc::new(MockSource { products: vec![] });
        let bootstrap = BootstrapIndexer::new(provider.clone(), source);

        let report = bootstrap.run(DocumentKind::Product).await.unwrap();
        assert_eq!(report.indexed, 0);
        assert!(provider.index_exists(DocumentKind::Product).await.unwrap());
    }

    #[tokio::test]
    async fn test_resync_tears_down_and_reloads() {
        let provider = Arc::new(MockProvider::new());
        let source = Arc::new(MockSource::with_products(2));
        let bootstrap = BootstrapIndexer::new(provider.clone(), source);

        bootstrap.run(DocumentKind::Product).await.unwrap();
        // Simulate drift: an extra document the source no longer has.
        provider
            .upsert_document(DocumentKind::Product, "ghost", &serde_json::json!({"id": "ghost"}))
            .await
            .unwrap();
        assert_eq!(provider.document_count(DocumentKind::Product), 3);

        let report = bootstrap.resync(DocumentKind::Product).await.unwrap();

        assert_eq!(report.indexed, 2);
        assert_eq!(provider.document_count(DocumentKind::Product), 2);
    }
}
