//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate. Single-document writes use
//! `refresh=true` so each applied change is immediately visible to reads.

use async_trait::async_trait;
use opensearch::http::request::JsonBody;
use opensearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use opensearch::indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts};
use opensearch::params::Refresh;
use opensearch::{BulkParts, DeleteParts, IndexParts, OpenSearch, SearchParts};
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::{dsl, index_config};
use crate::types::{BulkItemFailure, BulkWriteSummary, SearchPage};
use search_sync_shared::{DocumentKind, HistogramQuery, HistogramResponse, IndexQuery};

/// OpenSearch provider implementation.
///
/// # Example
///
/// ```ignore
/// let provider = OpenSearchProvider::new("http://localhost:9200")?;
/// provider.create_index(DocumentKind::Product).await?;
/// provider
///     .upsert_document(DocumentKind::Product, "7", &document)
///     .await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub fn new(url: &str) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch provider");

        Ok(Self { client })
    }

    /// Read a response body for error reporting, swallowing read failures.
    async fn error_body(response: opensearch::http::response::Response) -> String {
        response.text().await.unwrap_or_default()
    }

    /// Parse a bulk response into a per-item summary.
    fn parse_bulk_response(total: usize, body: &Value) -> BulkWriteSummary {
        let mut failures = Vec::new();

        if let Some(items) = body["items"].as_array() {
            for item in items {
                // Each bulk item is wrapped in its action name.
                let Some(entry) = item.get("index") else {
                    continue;
                };
                if let Some(error) = entry.get("error") {
                    failures.push(BulkItemFailure {
                        id: entry["_id"].as_str().unwrap_or("<unknown>").to_string(),
                        error: error.to_string(),
                    });
                }
            }
        }

        let failed = failures.len();
        BulkWriteSummary {
            total,
            succeeded: total.saturating_sub(failed),
            failures,
        }
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn ping(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchIndexError::unavailable(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(SearchIndexError::unavailable(format!(
                "ping returned status {}",
                status
            )));
        }
        Ok(())
    }

    async fn index_exists(&self, kind: DocumentKind) -> Result<bool, SearchIndexError> {
        let index = kind.index_name();
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::unavailable(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(SearchIndexError::unavailable(format!(
                "index existence check for {} returned status {}",
                index, status
            ))),
        }
    }

    async fn create_index(&self, kind: DocumentKind) -> Result<(), SearchIndexError> {
        let index = kind.index_name();
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(index_config::index_settings(kind))
            .send()
            .await
            .map_err(|e| SearchIndexError::unavailable(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = Self::error_body(response).await;
            error!(index = %index, status = %status, body = %body, "Index creation failed");
            return Err(SearchIndexError::index_creation(format!(
                "creating {} failed with status {}: {}",
                index, status, body
            )));
        }

        info!(index = %index, "Created index with explicit mapping");
        Ok(())
    }

    async fn delete_index(&self, kind: DocumentKind) -> Result<(), SearchIndexError> {
        let index = kind.index_name();
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::unavailable(e.to_string()))?;

        let status = response.status_code();
        // 404 is acceptable, the index may never have been created
        if !status.is_success() && status.as_u16() != 404 {
            let body = Self::error_body(response).await;
            return Err(SearchIndexError::index_deletion(format!(
                "deleting {} failed with status {}: {}",
                index, status, body
            )));
        }

        info!(index = %index, "Deleted index");
        Ok(())
    }

    async fn bulk_index(
        &self,
        kind: DocumentKind,
        documents: &[(String, Value)],
    ) -> Result<BulkWriteSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BulkWriteSummary::default());
        }

        let index = kind.index_name();
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);
        for (id, document) in documents {
            body.push(serde_json::json!({ "index": { "_id": id } }).into());
            body.push(document.clone().into());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .refresh(Refresh::True)
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::bulk_write(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = Self::error_body(response).await;
            error!(index = %index, status = %status, body = %body, "Bulk write failed");
            return Err(SearchIndexError::bulk_write(format!(
                "bulk write to {} failed with status {}: {}",
                index, status, body
            )));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = Self::parse_bulk_response(documents.len(), &parsed);
        debug!(
            index = %index,
            total = summary.total,
            failed = summary.failed(),
            "Bulk write completed"
        );
        Ok(summary)
    }

    async fn upsert_document(
        &self,
        kind: DocumentKind,
        id: &str,
        document: &Value,
    ) -> Result<(), SearchIndexError> {
        if id.is_empty() {
            return Err(SearchIndexError::validation("document id cannot be empty"));
        }

        let index = kind.index_name();
        // Full-document replace through the index API; refresh so the write
        // is visible to the next read.
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .refresh(Refresh::True)
            .body(document)
            .send()
            .await
            .map_err(|e| SearchIndexError::upsert(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = Self::error_body(response).await;
            error!(index = %index, doc_id = %id, status = %status, body = %body, "Upsert failed");
            return Err(SearchIndexError::upsert(format!(
                "upsert of {} into {} failed with status {}: {}",
                id, index, status, body
            )));
        }

        debug!(index = %index, doc_id = %id, "Document upserted");
        Ok(())
    }

    async fn delete_document(
        &self,
        kind: DocumentKind,
        id: &str,
    ) -> Result<(), SearchIndexError> {
        if id.is_empty() {
            return Err(SearchIndexError::validation("document id cannot be empty"));
        }

        let index = kind.index_name();
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, id))
            .refresh(Refresh::True)
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        let status = response.status_code();
        // 404 is acceptable, the document may not exist
        if !status.is_success() && status.as_u16() != 404 {
            let body = Self::error_body(response).await;
            error!(index = %index, doc_id = %id, status = %status, body = %body, "Delete failed");
            return Err(SearchIndexError::delete(format!(
                "delete of {} from {} failed with status {}: {}",
                id, index, status, body
            )));
        }

        debug!(index = %index, doc_id = %id, "Document deleted");
        Ok(())
    }

    async fn search(
        &self,
        kind: DocumentKind,
        query: &IndexQuery,
    ) -> Result<SearchPage, SearchIndexError> {
        let index = kind.index_name();
        let body = dsl::search_body(query);

        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::unavailable(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = Self::error_body(response).await;
            error!(index = %index, status = %status, body = %body, "Search query rejected");
            return Err(SearchIndexError::query(format!(
                "search against {} failed with status {}: {}",
                index, status, body
            )));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        Ok(SearchPage {
            hits: dsl::parse_search_hits(&parsed)?,
        })
    }

    async fn aggregate(
        &self,
        kind: DocumentKind,
        query: &HistogramQuery,
    ) -> Result<HistogramResponse, SearchIndexError> {
        let index = kind.index_name();
        let body = dsl::histogram_body(query);

        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::unavailable(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = Self::error_body(response).await;
            error!(index = %index, status = %status, body = %body, "Aggregation query rejected");
            return Err(SearchIndexError::query(format!(
                "aggregation against {} failed with status {}: {}",
                index, status, body
            )));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        dsl::parse_histogram(&parsed, &query.metric)
    }
}
