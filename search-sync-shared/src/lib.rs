//! # Search Sync Shared
//!
//! This crate defines shared data structures and types used across the
//! storefront search-sync pipeline. It includes the indexed document shapes
//! (products, users, invoices), the change envelope wire format, the sort
//! specification parser with its per-kind allow-list maps, the structured
//! query model, and the calendar-interval aggregation types.

pub mod types;

pub use types::aggregation::{
    AggregationError, CalendarInterval, HistogramBucket, HistogramMetric, HistogramQuery,
    HistogramReport, HistogramResponse, ReportBucket, BUCKET_KEY_FORMAT_CHRONO,
    BUCKET_KEY_FORMAT_INDEX,
};
pub use types::document::{DocumentKind, InvoiceDocument, ProductDocument, UserDocument};
pub use types::envelope::{ChangeEnvelope, ChangeOp, EnvelopeError};
pub use types::query::{
    IndexQuery, QueryClause, SortField, DATE_FILTER_FORMAT_CHRONO, DATE_FILTER_FORMAT_INDEX,
};
pub use types::request::{
    clamp_limit, InvoiceSearchRequest, ProductSearchRequest, UserSearchRequest,
    DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
pub use types::sort::{
    parse_sort_spec, resolve_sort_field, sort_field_map, SortDirection, SortTerm,
};
