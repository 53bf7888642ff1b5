//! Serialization of the structured query model to the OpenSearch DSL.
//!
//! The query and aggregation translators build backend-agnostic
//! [`IndexQuery`] / [`HistogramQuery`] values; this module turns them into
//! OpenSearch request bodies and parses the responses back. Keeping the
//! conversion in one place means the translators never see the wire DSL.

use serde_json::{json, Map, Value};

use crate::errors::SearchIndexError;
use search_sync_shared::types::aggregation::BUCKET_KEY_FORMAT_INDEX;
use search_sync_shared::{
    HistogramBucket, HistogramMetric, HistogramQuery, HistogramResponse, IndexQuery, QueryClause,
};

/// Serialize one clause into its OpenSearch query form.
fn clause_body(clause: &QueryClause) -> Value {
    match clause {
        QueryClause::MatchAll => json!({ "match_all": {} }),
        QueryClause::Match { field, value } => json!({
            "term": { field.as_str(): { "value": value } }
        }),
        QueryClause::Range { field, gte, lte, format } => {
            let mut bounds = Map::new();
            if let Some(gte) = gte {
                bounds.insert("gte".to_string(), gte.clone());
            }
            if let Some(lte) = lte {
                bounds.insert("lte".to_string(), lte.clone());
            }
            if let Some(format) = format {
                bounds.insert("format".to_string(), Value::from(format.clone()));
            }
            json!({ "range": { field.as_str(): Value::Object(bounds) } })
        }
    }
}

/// Serialize a conjunctive clause list.
///
/// A single match-all collapses to a bare `match_all`; anything else becomes
/// a `bool.must` conjunction.
fn filter_body(clauses: &[QueryClause]) -> Value {
    match clauses {
        [] | [QueryClause::MatchAll] => json!({ "match_all": {} }),
        many => json!({
            "bool": {
                "must": many.iter().map(clause_body).collect::<Vec<_>>()
            }
        }),
    }
}

/// Serialize a structured search query into an OpenSearch request body.
pub fn search_body(query: &IndexQuery) -> Value {
    let mut body = json!({
        "from": query.offset,
        "size": query.limit,
        "query": filter_body(&query.clauses)
    });

    if !query.sort.is_empty() {
        let sort: Vec<Value> = query
            .sort
            .iter()
            .map(|s| json!({ s.field.as_str(): { "order": s.direction.as_str() } }))
            .collect();
        body["sort"] = Value::Array(sort);
    }

    body
}

/// Serialize a histogram aggregation into an OpenSearch request body.
///
/// Buckets on `created_at` with the declared bucket-key format, computes the
/// per-bucket metric, and adds an average-of-buckets pipeline aggregation.
pub fn histogram_body(query: &HistogramQuery) -> Value {
    let (metric_aggs, buckets_path) = match &query.metric {
        HistogramMetric::Sum { field } => (
            Some(json!({ "metric": { "sum": { "field": field } } })),
            "per_interval>metric",
        ),
        HistogramMetric::Count => (None, "per_interval>_count"),
    };

    let mut per_interval = json!({
        "date_histogram": {
            "field": "created_at",
            "calendar_interval": query.interval.as_str(),
            "format": BUCKET_KEY_FORMAT_INDEX
        }
    });
    if let Some(metric_aggs) = metric_aggs {
        per_interval["aggs"] = metric_aggs;
    }

    json!({
        "size": 0,
        "query": filter_body(&query.clauses),
        "aggs": {
            "per_interval": per_interval,
            "average": {
                "avg_bucket": {
                    "buckets_path": buckets_path,
                    "gap_policy": "skip"
                }
            }
        }
    })
}

/// Extract the flat document list from a search response, in response order.
pub fn parse_search_hits(response: &Value) -> Result<Vec<Value>, SearchIndexError> {
    let hits = response["hits"]["hits"]
        .as_array()
        .ok_or_else(|| SearchIndexError::parse("search response missing hits.hits array"))?;

    hits.iter()
        .map(|hit| {
            hit.get("_source")
                .cloned()
                .ok_or_else(|| SearchIndexError::parse("search hit missing _source"))
        })
        .collect()
}

/// Reshape an aggregation response into raw buckets plus the bucket average.
pub fn parse_histogram(
    response: &Value,
    metric: &HistogramMetric,
) -> Result<HistogramResponse, SearchIndexError> {
    let raw_buckets = response["aggregations"]["per_interval"]["buckets"]
        .as_array()
        .ok_or_else(|| SearchIndexError::parse("aggregation response missing buckets"))?;

    let mut buckets = Vec::with_capacity(raw_buckets.len());
    for bucket in raw_buckets {
        let key = bucket["key_as_string"]
            .as_str()
            .ok_or_else(|| SearchIndexError::parse("bucket missing key_as_string"))?
            .to_string();
        let doc_count = bucket["doc_count"].as_u64().unwrap_or(0);
        let value = match metric {
            HistogramMetric::Sum { .. } => bucket["metric"]["value"].as_f64().unwrap_or(0.0),
            HistogramMetric::Count => doc_count as f64,
        };
        buckets.push(HistogramBucket {
            key,
            doc_count,
            value,
        });
    }

    // avg_bucket reports null over an empty bucket set.
    let average = response["aggregations"]["average"]["value"]
        .as_f64()
        .unwrap_or(0.0);

    Ok(HistogramResponse { buckets, average })
}
