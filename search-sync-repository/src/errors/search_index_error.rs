//! Search index error types.
//!
//! This module defines the unified error type for all search index
//! operations. Callers on the read path must be able to tell an unreachable
//! index apart from an empty result set, so transport-level failures map to
//! the distinct [`SearchIndexError::Unavailable`] variant.

use thiserror::Error;

/// Unified errors from search index operations.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Validation error (e.g. empty document id, malformed input).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to establish connection to the search index backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The index store could not be reached or did not answer. Retryable;
    /// never to be conflated with zero matches.
    #[error("Search index unavailable: {0}")]
    Unavailable(String),

    /// Failed to create the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to delete the search index.
    #[error("Index deletion error: {0}")]
    IndexDeletionError(String),

    /// Failed to upsert a document.
    #[error("Upsert error: {0}")]
    UpsertError(String),

    /// Failed to delete a document.
    #[error("Delete error: {0}")]
    DeleteError(String),

    /// Bulk write operation failed as a whole.
    #[error("Bulk write error: {0}")]
    BulkWriteError(String),

    /// The index store rejected a search or aggregation query.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Failed to parse a response from the search index backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search index backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create an index deletion error.
    pub fn index_deletion(msg: impl Into<String>) -> Self {
        Self::IndexDeletionError(msg.into())
    }

    /// Create an upsert error.
    pub fn upsert(msg: impl Into<String>) -> Self {
        Self::UpsertError(msg.into())
    }

    /// Create a delete error.
    pub fn delete(msg: impl Into<String>) -> Self {
        Self::DeleteError(msg.into())
    }

    /// Create a bulk write error.
    pub fn bulk_write(msg: impl Into<String>) -> Self {
        Self::BulkWriteError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// True for failures a caller may retry after the index store recovers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SearchIndexError::Unavailable(_) | SearchIndexError::ConnectionError(_)
        )
    }
}
