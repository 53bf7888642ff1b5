//! Structured query model for the search index.
//!
//! The query translator builds these tagged clause variants; the repository
//! layer serializes them once into the index store's own query DSL. Keeping
//! the model backend-agnostic lets translator logic be tested without a
//! running index.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::sort::SortDirection;

/// Literal date-time format for range filter values, chrono syntax.
pub const DATE_FILTER_FORMAT_CHRONO: &str = "%Y-%m-%d %H:%M:%S";

/// The same format expressed in the index store's date-format syntax. Range
/// clauses over date fields carry this as an explicit hint to the index's
/// date parser.
pub const DATE_FILTER_FORMAT_INDEX: &str = "yyyy-MM-dd HH:mm:ss";

/// One filter clause in a conjunctive condition list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryClause {
    /// Matches every document. Emitted explicitly when no filters are present.
    MatchAll,

    /// Exact match on a single field (term-level, not analyzed).
    Match { field: String, value: Value },

    /// Range over a numeric or date field. At least one bound is present;
    /// date fields carry the literal format hint.
    Range {
        field: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        gte: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        lte: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
}

impl QueryClause {
    /// Exact-match clause on a keyword field.
    pub fn exact(field: impl Into<String>, value: impl Into<Value>) -> Self {
        QueryClause::Match {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Numeric range clause; emitted only when at least one bound exists.
    pub fn numeric_range(
        field: impl Into<String>,
        gte: Option<i64>,
        lte: Option<i64>,
    ) -> Option<Self> {
        if gte.is_none() && lte.is_none() {
            return None;
        }
        Some(QueryClause::Range {
            field: field.into(),
            gte: gte.map(Value::from),
            lte: lte.map(Value::from),
            format: None,
        })
    }

    /// Date range clause over literal date-time strings; emitted only when at
    /// least one bound exists. Always carries the format hint.
    pub fn date_range(
        field: impl Into<String>,
        gte: Option<String>,
        lte: Option<String>,
    ) -> Option<Self> {
        if gte.is_none() && lte.is_none() {
            return None;
        }
        Some(QueryClause::Range {
            field: field.into(),
            gte: gte.map(Value::from),
            lte: lte.map(Value::from),
            format: Some(DATE_FILTER_FORMAT_INDEX.to_string()),
        })
    }
}

/// One resolved sort entry: physical index field plus normalized direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

/// A complete structured search query: paging, conjunctive filter clauses,
/// and an ordered sort list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuery {
    pub offset: usize,
    pub limit: usize,
    pub clauses: Vec<QueryClause>,
    pub sort: Vec<SortField>,
}

impl IndexQuery {
    /// True when the only clause is a match-all.
    pub fn is_match_all(&self) -> bool {
        matches!(self.clauses.as_slice(), [QueryClause::MatchAll])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_range_requires_a_bound() {
        assert!(QueryClause::numeric_range("price_cents", None, None).is_none());
        let clause = QueryClause::numeric_range("price_cents", Some(100), None).unwrap();
        match clause {
            QueryClause::Range { gte, lte, format, .. } => {
                assert_eq!(gte, Some(Value::from(100)));
                assert!(lte.is_none());
                assert!(format.is_none());
            }
            other => panic!("unexpected clause: {other:?}"),
        }
    }

    #[test]
    fn test_date_range_carries_format_hint() {
        let clause =
            QueryClause::date_range("created_at", Some("2024-03-01 00:00:00".to_string()), None)
                .unwrap();
        match clause {
            QueryClause::Range { format, .. } => {
                assert_eq!(format.as_deref(), Some(DATE_FILTER_FORMAT_INDEX));
            }
            other => panic!("unexpected clause: {other:?}"),
        }
    }
}
