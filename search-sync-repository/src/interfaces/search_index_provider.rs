//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch,
//! Elasticsearch, etc.). Implementations are injected into the bootstrap
//! indexer, the incremental listener loops, and the query translators, which
//! enables isolated testing with in-memory fakes.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::{BulkWriteSummary, SearchPage};
use search_sync_shared::{DocumentKind, HistogramQuery, HistogramResponse, IndexQuery};

/// Abstracts the underlying search index store.
///
/// All write operations are keyed by the stable document id and perform a
/// full-document replace, so applying the same write twice leaves the index
/// in the same state. Single-document writes refresh synchronously: once a
/// call returns, the write is visible to subsequent reads.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Check that the index store answers at all.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the store is reachable
    /// * `Err(SearchIndexError::Unavailable)` - If it is not
    async fn ping(&self) -> Result<(), SearchIndexError>;

    /// Check whether the index for the given kind exists.
    async fn index_exists(&self, kind: DocumentKind) -> Result<bool, SearchIndexError>;

    /// Create the index for the given kind with its fixed field mapping.
    ///
    /// Text fields get an analyzed form plus an exact `keyword` sub-field;
    /// numeric and date fields keep native types.
    async fn create_index(&self, kind: DocumentKind) -> Result<(), SearchIndexError>;

    /// Delete the index for the given kind. Absence is not an error; this
    /// exists only for the explicit destructive resync path.
    async fn delete_index(&self, kind: DocumentKind) -> Result<(), SearchIndexError>;

    /// Write a batch of `(stable id, document)` pairs through the bulk API.
    ///
    /// Per-item failures are collected in the returned summary and never
    /// abort sibling items. The call itself fails only when the bulk request
    /// as a whole cannot be executed.
    async fn bulk_index(
        &self,
        kind: DocumentKind,
        documents: &[(String, Value)],
    ) -> Result<BulkWriteSummary, SearchIndexError>;

    /// Full-document upsert by stable id, with synchronous refresh.
    async fn upsert_document(
        &self,
        kind: DocumentKind,
        id: &str,
        document: &Value,
    ) -> Result<(), SearchIndexError>;

    /// Delete by stable id, with synchronous refresh. Deleting a document
    /// that does not exist is a success.
    async fn delete_document(&self, kind: DocumentKind, id: &str)
        -> Result<(), SearchIndexError>;

    /// Execute a structured search (filter + sort + paginate) and return the
    /// hit documents in response order.
    async fn search(
        &self,
        kind: DocumentKind,
        query: &IndexQuery,
    ) -> Result<SearchPage, SearchIndexError>;

    /// Execute a date-histogram aggregation (filter + interval + metric) and
    /// return raw buckets plus the average-of-buckets summary.
    async fn aggregate(
        &self,
        kind: DocumentKind,
        query: &HistogramQuery,
    ) -> Result<HistogramResponse, SearchIndexError>;
}
