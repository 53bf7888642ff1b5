//! Error types for the search-sync pipeline.

use thiserror::Error;

use search_sync_repository::SearchIndexError;
use search_sync_shared::{AggregationError, EnvelopeError};

/// Errors that can occur in the search-sync pipeline.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Bootstrap precondition violation: the index is already present.
    /// Bootstrap runs at most once successfully per index lifetime; a second
    /// run is reported, never silently absorbed.
    #[error("index {0} already exists after first sync")]
    IndexAlreadyExists(&'static str),

    /// Remote snapshot fetch failed; the bootstrap load is all-or-nothing.
    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    /// One or more documents failed during a bulk load.
    #[error("Bulk load error: {0}")]
    BulkLoadError(String),

    /// Broadcast channel error (publish after shutdown, closed topic).
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// A change envelope could not be decoded.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// A read request failed validation before translation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Error from the search index store.
    #[error(transparent)]
    Index(#[from] SearchIndexError),
}

impl SyncError {
    /// Create a snapshot error.
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::SnapshotError(msg.into())
    }

    /// Create a bulk load error.
    pub fn bulk_load(msg: impl Into<String>) -> Self {
        Self::BulkLoadError(msg.into())
    }

    /// Create a channel error.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::ChannelError(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// True for failures the caller may retry once the index store recovers.
    /// Keeps "index unreachable" distinct from "zero matches" on read paths.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Index(e) if e.is_retryable())
    }
}

impl From<EnvelopeError> for SyncError {
    fn from(err: EnvelopeError) -> Self {
        Self::DecodeError(err.to_string())
    }
}

impl From<AggregationError> for SyncError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::UnsupportedInterval(_) => Self::InvalidRequest(err.to_string()),
            AggregationError::InvalidBucketKey { .. } => Self::DecodeError(err.to_string()),
        }
    }
}
