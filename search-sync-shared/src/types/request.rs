//! Inbound read request shapes.
//!
//! These are the only contract the query translator needs from the HTTP
//! layer: offset, limit, a sort string, and a fixed set of named optional
//! filters per entity kind. Range filters carry independent optional bounds;
//! date bounds are literal strings in the fixed filter format.

use serde::{Deserialize, Serialize};

/// Largest page size a caller may request; larger values are clamped.
pub const MAX_PAGE_LIMIT: usize = 10;

/// Page size used when the caller asks for zero.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Product search request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductSearchRequest {
    pub offset: usize,
    pub limit: usize,
    /// Comma-separated sort specification, e.g. `"price:desc,name"`.
    pub sort: Option<String>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub category_name: Option<String>,
    pub brand_name: Option<String>,
    pub status: Option<String>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
}

/// User search request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSearchRequest {
    pub offset: usize,
    pub limit: usize,
    pub sort: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
}

/// Invoice search request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceSearchRequest {
    pub offset: usize,
    pub limit: usize,
    pub sort: Option<String>,
    pub status: Option<String>,
    pub user_id: Option<String>,
    pub total_min: Option<i64>,
    pub total_max: Option<i64>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
}

/// Clamp a requested page limit into the allowed `1..=MAX_PAGE_LIMIT` range.
pub fn clamp_limit(limit: usize) -> usize {
    if limit == 0 {
        DEFAULT_PAGE_LIMIT
    } else {
        limit.min(MAX_PAGE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(0), DEFAULT_PAGE_LIMIT);
        assert_eq!(clamp_limit(1), 1);
        assert_eq!(clamp_limit(10), 10);
        assert_eq!(clamp_limit(500), MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let req: ProductSearchRequest = serde_json::from_str(r#"{"name":"Shoe"}"#).unwrap();
        assert_eq!(req.offset, 0);
        assert_eq!(req.limit, 0);
        assert_eq!(req.name.as_deref(), Some("Shoe"));
        assert!(req.sort.is_none());
        assert!(req.price_min.is_none());
    }
}
