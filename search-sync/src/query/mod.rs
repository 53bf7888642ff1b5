//! Query translator: flat read requests into structured index queries.
//!
//! Translation is pure and deterministic. Absent filters contribute nothing;
//! present filters become one clause each, combined conjunctively; a request
//! with no filters becomes an explicit match-all. Paging is clamped, never
//! rejected. Sort terms naming fields outside the per-kind allow-list are
//! dropped with a warning rather than passed through to the index.

pub mod aggregation;

use std::sync::Arc;
use tracing::{instrument, warn};

use crate::errors::SyncError;
use search_sync_repository::{SearchIndexProvider, SearchPage};
use search_sync_shared::{
    clamp_limit, parse_sort_spec, resolve_sort_field, DocumentKind, IndexQuery,
    InvoiceSearchRequest, ProductSearchRequest, QueryClause, SortField, UserSearchRequest,
    DATE_FILTER_FORMAT_CHRONO,
};

/// Validate a literal date filter bound against the fixed filter format.
///
/// A bound that does not parse is a request error surfaced before any query
/// is sent to the index.
fn validate_date_bound(field: &str, value: &str) -> Result<String, SyncError> {
    chrono::NaiveDateTime::parse_from_str(value, DATE_FILTER_FORMAT_CHRONO).map_err(|e| {
        SyncError::invalid_request(format!(
            "invalid {field} value {value:?}, expected \"YYYY-MM-DD hh:mm:ss\": {e}"
        ))
    })?;
    Ok(value.to_string())
}

/// Build the validated `created_at` range clause from optional literal bounds.
pub(crate) fn created_at_clause(
    created_after: Option<&str>,
    created_before: Option<&str>,
) -> Result<Option<QueryClause>, SyncError> {
    let gte = created_after
        .map(|v| validate_date_bound("created_after", v))
        .transpose()?;
    let lte = created_before
        .map(|v| validate_date_bound("created_before", v))
        .transpose()?;
    Ok(QueryClause::date_range("created_at", gte, lte))
}

/// Resolve a sort specification through the kind's allow-list, dropping
/// unmapped terms with a warning.
fn build_sort(kind: DocumentKind, spec: Option<&str>) -> Vec<SortField> {
    let Some(spec) = spec else {
        return Vec::new();
    };
    parse_sort_spec(spec)
        .into_iter()
        .filter_map(|term| match resolve_sort_field(kind, &term.field) {
            Some(physical) => Some(SortField {
                field: physical.to_string(),
                direction: term.direction,
            }),
            None => {
                warn!(kind = %kind, field = %term.field, "Dropping unknown sort field");
                None
            }
        })
        .collect()
}

/// Assemble the final query: explicit match-all when no filters survived.
fn assemble(
    kind: DocumentKind,
    offset: usize,
    limit: usize,
    clauses: Vec<QueryClause>,
    sort_spec: Option<&str>,
) -> IndexQuery {
    let clauses = if clauses.is_empty() {
        vec![QueryClause::MatchAll]
    } else {
        clauses
    };
    IndexQuery {
        offset,
        limit: clamp_limit(limit),
        clauses,
        sort: build_sort(kind, sort_spec),
    }
}

/// Translate a product search request.
pub fn translate_product(request: &ProductSearchRequest) -> Result<IndexQuery, SyncError> {
    let mut clauses = Vec::new();
    if let Some(name) = &request.name {
        clauses.push(QueryClause::exact("name.keyword", name.as_str()));
    }
    if let Some(sku) = &request.sku {
        clauses.push(QueryClause::exact("sku", sku.as_str()));
    }
    if let Some(category) = &request.category_name {
        clauses.push(QueryClause::exact("category_name.keyword", category.as_str()));
    }
    if let Some(brand) = &request.brand_name {
        clauses.push(QueryClause::exact("brand_name.keyword", brand.as_str()));
    }
    if let Some(status) = &request.status {
        clauses.push(QueryClause::exact("status", status.as_str()));
    }
    clauses.extend(QueryClause::numeric_range(
        "price_cents",
        request.price_min,
        request.price_max,
    ));
    clauses.extend(created_at_clause(
        request.created_after.as_deref(),
        request.created_before.as_deref(),
    )?);

    Ok(assemble(
        DocumentKind::Product,
        request.offset,
        request.limit,
        clauses,
        request.sort.as_deref(),
    ))
}

/// Translate a user search request.
pub fn translate_user(request: &UserSearchRequest) -> Result<IndexQuery, SyncError> {
    let mut clauses = Vec::new();
    if let Some(email) = &request.email {
        clauses.push(QueryClause::exact("email.keyword", email.as_str()));
    }
    if let Some(role) = &request.role {
        clauses.push(QueryClause::exact("role", role.as_str()));
    }
    clauses.extend(created_at_clause(
        request.created_after.as_deref(),
        request.created_before.as_deref(),
    )?);

    Ok(assemble(
        DocumentKind::User,
        request.offset,
        request.limit,
        clauses,
        request.sort.as_deref(),
    ))
}

/// Translate an invoice search request.
pub fn translate_invoice(request: &InvoiceSearchRequest) -> Result<IndexQuery, SyncError> {
    let mut clauses = Vec::new();
    if let Some(status) = &request.status {
        clauses.push(QueryClause::exact("status", status.as_str()));
    }
    if let Some(user_id) = &request.user_id {
        clauses.push(QueryClause::exact("user_id", user_id.as_str()));
    }
    clauses.extend(QueryClause::numeric_range(
        "total_cents",
        request.total_min,
        request.total_max,
    ));
    clauses.extend(created_at_clause(
        request.created_after.as_deref(),
        request.created_before.as_deref(),
    )?);

    Ok(assemble(
        DocumentKind::Invoice,
        request.offset,
        request.limit,
        clauses,
        request.sort.as_deref(),
    ))
}

/// Read-side facade: translates requests and runs them against the index.
pub struct QueryTranslator {
    provider: Arc<dyn SearchIndexProvider>,
}

impl QueryTranslator {
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self { provider }
    }

    #[instrument(skip(self, request))]
    pub async fn search_products(
        &self,
        request: &ProductSearchRequest,
    ) -> Result<SearchPage, SyncError> {
        let query = translate_product(request)?;
        Ok(self.provider.search(DocumentKind::Product, &query).await?)
    }

    #[instrument(skip(self, request))]
    pub async fn search_users(&self, request: &UserSearchRequest) -> Result<SearchPage, SyncError> {
        let query = translate_user(request)?;
        Ok(self.provider.search(DocumentKind::User, &query).await?)
    }

    #[instrument(skip(self, request))]
    pub async fn search_invoices(
        &self,
        request: &InvoiceSearchRequest,
    ) -> Result<SearchPage, SyncError> {
        let query = translate_invoice(request)?;
        Ok(self.provider.search(DocumentKind::Invoice, &query).await?)
    }
}
