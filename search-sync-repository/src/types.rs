//! Result types for search index operations.

use serde_json::Value;

use crate::errors::SearchIndexError;

/// One failed item from a bulk write.
#[derive(Debug, Clone)]
pub struct BulkItemFailure {
    /// Stable document id of the failed item.
    pub id: String,
    /// Backend error description for this item.
    pub error: String,
}

/// Summary of a bulk write: aggregate counts plus per-item failures.
///
/// Individual item failures never abort the batch; callers inspect the
/// summary and decide whether the batch as a whole counts as failed.
#[derive(Debug, Clone, Default)]
pub struct BulkWriteSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of items the index store accepted.
    pub succeeded: usize,
    /// The items the index store rejected.
    pub failures: Vec<BulkItemFailure>,
}

impl BulkWriteSummary {
    /// True when at least one item failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Number of failed items.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Collapse the summary into a single aggregate error if anything failed.
    pub fn into_result(self) -> Result<BulkWriteSummary, SearchIndexError> {
        if self.has_failures() {
            Err(SearchIndexError::bulk_write(format!(
                "{} of {} documents failed to index",
                self.failed(),
                self.total
            )))
        } else {
            Ok(self)
        }
    }
}

/// One page of search hits, in response order.
#[derive(Debug, Clone)]
pub struct SearchPage {
    /// Raw document sources as returned by the index store.
    pub hits: Vec<Value>,
}
