//! Incremental indexer listener loops.
//!
//! One long-lived loop per (entity kind, operation) channel, nine in total.
//! Each loop decodes the payload for its channel, applies the single
//! corresponding index write, and keeps running: a malformed payload or a
//! failed write is logged and skipped, never retried and never fatal to the
//! loop. Within one channel, writes are applied in arrival order because the
//! loop is strictly sequential.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::bus::ChannelBus;
use crate::errors::SyncError;
use search_sync_repository::SearchIndexProvider;
use search_sync_shared::{ChangeEnvelope, ChangeOp, DocumentKind};

/// Running totals across all listener loops.
#[derive(Debug, Default)]
pub struct ListenerCounters {
    pub upserts: AtomicU64,
    pub deletes: AtomicU64,
    pub skipped: AtomicU64,
}

impl ListenerCounters {
    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.upserts.load(Ordering::Relaxed),
            self.deletes.load(Ordering::Relaxed),
            self.skipped.load(Ordering::Relaxed),
        )
    }
}

/// Applies decoded change notifications to the search index.
pub struct ChangeListener {
    provider: Arc<dyn SearchIndexProvider>,
    counters: Arc<ListenerCounters>,
}

impl ChangeListener {
    /// Create a listener over the given provider.
    pub fn new(provider: Arc<dyn SearchIndexProvider>, counters: Arc<ListenerCounters>) -> Self {
        Self { provider, counters }
    }

    /// Run one channel loop until the channel closes or shutdown fires.
    ///
    /// Messages dropped by a lagging receiver are counted and logged; they
    /// are not replayed. Everything else follows log-and-continue.
    #[instrument(skip(self, rx, shutdown), fields(kind = %kind, op = %op))]
    pub async fn run_loop(
        &self,
        kind: DocumentKind,
        op: ChangeOp,
        mut rx: broadcast::Receiver<String>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!(channel = %kind.channel(op), "Listener loop started");
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(payload) => {
                        if let Err(e) = self.apply(kind, op, &payload).await {
                            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                            error!(
                                channel = %kind.channel(op),
                                error = %e,
                                "Skipping change that could not be applied"
                            );
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        self.counters.skipped.fetch_add(missed, Ordering::Relaxed);
                        warn!(
                            channel = %kind.channel(op),
                            missed,
                            "Listener lagged; dropped messages are not replayed"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!(channel = %kind.channel(op), "Channel closed, listener loop exiting");
                        break;
                    }
                },
                _ = shutdown.recv() => {
                    info!(channel = %kind.channel(op), "Shutdown received, listener loop exiting");
                    break;
                }
            }
        }
    }

    /// Decode one payload and apply its single index write.
    async fn apply(&self, kind: DocumentKind, op: ChangeOp, payload: &str) -> Result<(), SyncError> {
        match op {
            ChangeOp::Created | ChangeOp::Updated => {
                let envelope = ChangeEnvelope::decode_upsert(kind, op, payload)?;
                let document = envelope
                    .payload
                    .ok_or_else(|| SyncError::decode("upsert envelope without payload"))?;
                self.provider
                    .upsert_document(kind, &envelope.document_id, &document)
                    .await?;
                self.counters.upserts.fetch_add(1, Ordering::Relaxed);
                debug!(kind = %kind, doc_id = %envelope.document_id, op = %op, "Applied upsert");
            }
            ChangeOp::Deleted => {
                let envelope = ChangeEnvelope::decode_delete(kind, payload)?;
                self.provider
                    .delete_document(kind, &envelope.document_id)
                    .await?;
                self.counters.deletes.fetch_add(1, Ordering::Relaxed);
                debug!(kind = %kind, doc_id = %envelope.document_id, "Applied delete");
            }
        }
        Ok(())
    }
}

/// Subscribe and spawn the nine listener loops, one per (kind, operation).
///
/// Subscriptions happen here, before any loop is spawned, so no loop can miss
/// traffic published after this function returns.
pub fn spawn_listeners(
    bus: &ChannelBus,
    provider: Arc<dyn SearchIndexProvider>,
    counters: Arc<ListenerCounters>,
    shutdown: &broadcast::Sender<()>,
) -> Result<Vec<JoinHandle<()>>, SyncError> {
    let mut handles = Vec::with_capacity(DocumentKind::ALL.len() * ChangeOp::ALL.len());
    for kind in DocumentKind::ALL {
        for op in ChangeOp::ALL {
            let rx = bus.subscribe(&kind.channel(op))?;
            let listener = ChangeListener::new(provider.clone(), counters.clone());
            let shutdown_rx = shutdown.subscribe();
            handles.push(tokio::spawn(async move {
                listener.run_loop(kind, op, rx, shutdown_rx).await;
            }));
        }
    }
    Ok(handles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use search_sync_repository::{BulkWriteSummary, SearchIndexError, SearchPage};
    use search_sync_shared::{HistogramQuery, HistogramResponse, IndexQuery, ProductDocument};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingProvider {
        documents: Mutex<HashMap<String, serde_json::Value>>,
    }

    impl RecordingProvider {
        fn new() -> Self {
            Self {
                documents: Mutex::new(HashMap::new()),
            }
        }

        fn get(&self, id: &str) -> Option<serde_json::Value> {
            self.documents.lock().unwrap().get(id).cloned()
        }
    }

    #[async_trait]
    impl SearchIndexProvider for RecordingProvider {
        async fn ping(&self) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn index_exists(&self, _kind: DocumentKind) -> Result<bool, SearchIndexError> {
            Ok(true)
        }

        async fn create_index(&self, _kind: DocumentKind) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn delete_index(&self, _kind: DocumentKind) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn bulk_index(
            &self,
            _kind: DocumentKind,
            documents: &[(String, serde_json::Value)],
        ) -> Result<BulkWriteSummary, SearchIndexError> {
            Ok(BulkWriteSummary {
                total: documents.len(),
                succeeded: documents.len(),
                failures: vec![],
            })
        }

        async fn upsert_document(
            &self,
            _kind: DocumentKind,
            id: &str,
            document: &serde_json::Value,
        ) -> Result<(), SearchIndexError> {
            self.documents
                .lock()
                .unwrap()
                .insert(id.to_string(), document.clone());
            Ok(())
        }

        async fn delete_document(
            &self,
            _kind: DocumentKind,
            id: &str,
        ) -> Result<(), SearchIndexError> {
            self.documents.lock().unwrap().remove(id);
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

    fn sample_product(id: &str, price_cents: i64) -> ProductDocument {
        ProductDocument {
            id: id.to_string(),
            name: "Widget".to_string(),
            description: None,
            sku: format!("W-{id}"),
            category_name: "Tools".to_string(),
            brand_name: "Acme".to_string(),
            price_cents,
            status: "active".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn settle() {
        // Let spawned loops drain their channels.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_created_then_deleted_flows_through_loops() {
        let bus = ChannelBus::new();
        let provider = Arc::new(RecordingProvider::new());
        let counters = Arc::new(ListenerCounters::default());
        let (shutdown_tx, _) = broadcast::channel(1);

        let handles = spawn_listeners(
            &bus,
            provider.clone(),
            counters.clone(),
            &shutdown_tx,
        )
        .unwrap();

        let payload =
            ChangeEnvelope::encode_upsert(&sample_product("7", 10000), DocumentKind::Product)
                .unwrap();
        bus.publish(
            &DocumentKind::Product.channel(ChangeOp::Created),
            payload,
        )
        .unwrap();
        settle().await;
        assert_eq!(provider.get("7").unwrap()["price_cents"], 10000);

        bus.publish(
            &DocumentKind::Product.channel(ChangeOp::Deleted),
            ChangeEnvelope::encode_delete("7"),
        )
        .unwrap();
        settle().await;
        assert!(provider.get("7").is_none());

        let (upserts, deletes, skipped) = counters.snapshot();
        assert_eq!((upserts, deletes, skipped), (1, 1, 0));

        bus.close();
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_malformed_payload_is_skipped_not_fatal() {
        let bus = ChannelBus::new();
        let provider = Arc::new(RecordingProvider::new());
        let counters = Arc::new(ListenerCounters::default());
        let (shutdown_tx, _) = broadcast::channel(1);

        let handles =
            spawn_listeners(&bus, provider.clone(), counters.clone(), &shutdown_tx).unwrap();

        let channel = DocumentKind::Product.channel(ChangeOp::Created);
        bus.publish(&channel, "not json at all".to_string()).unwrap();
        let payload =
            ChangeEnvelope::encode_upsert(&sample_product("8", 2500), DocumentKind::Product)
                .unwrap();
        bus.publish(&channel, payload).unwrap();
        settle().await;

        // The bad message was skipped and the loop kept going.
        assert_eq!(provider.get("8").unwrap()["price_cents"], 2500);
        let (upserts, _, skipped) = counters.snapshot();
        assert_eq!(upserts, 1);
        assert_eq!(skipped, 1);

        bus.close();
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_delete_of_absent_document_is_success() {
        let bus = ChannelBus::new();
        let provider = Arc::new(RecordingProvider::new());
        let counters = Arc::new(ListenerCounters::default());
        let (shutdown_tx, _) = broadcast::channel(1);

        let handles =
            spawn_listeners(&bus, provider.clone(), counters.clone(), &shutdown_tx).unwrap();

        bus.publish(
            &DocumentKind::Invoice.channel(ChangeOp::Deleted),
            ChangeEnvelope::encode_delete("never-indexed"),
        )
        .unwrap();
        settle().await;

        let (_, deletes, skipped) = counters.snapshot();
        assert_eq!(deletes, 1);
        assert_eq!(skipped, 0);

        bus.close();
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops_loops() {
        let bus = ChannelBus::new();
        let provider = Arc::new(RecordingProvider::new());
        let counters = Arc::new(ListenerCounters::default());
        let (shutdown_tx, _) = broadcast::channel(1);

        let handles =
            spawn_listeners(&bus, provider, counters, &shutdown_tx).unwrap();

        shutdown_tx.send(()).unwrap();
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
