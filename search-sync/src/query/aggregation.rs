//! Aggregation translator: calendar-interval histogram reports.
//!
//! Fixed report shapes over the indices: invoice revenue (sum of
//! `total_cents` per bucket) and user signups (document count per bucket).
//! The index store performs the bucketing; this layer builds the request,
//! validates inputs up front, and reshapes the bucketed response into a
//! uniform report with derived bucket end times.

use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;

use crate::errors::SyncError;
use crate::query::created_at_clause;
use search_sync_repository::SearchIndexProvider;
use search_sync_shared::{
    CalendarInterval, DocumentKind, HistogramMetric, HistogramQuery, HistogramReport, QueryClause,
    ReportBucket,
};

/// Report filter: an optional time window (literal date-time strings in the
/// filter format) and an optional exact status match. Everything optional; an
/// unfiltered report covers every document in the index.
#[derive(Debug, Clone, Default)]
pub struct ReportWindow {
    pub from: Option<String>,
    pub to: Option<String>,
    pub status: Option<String>,
}

/// Builds histogram queries and reshapes bucketed responses.
pub struct AggregationTranslator {
    provider: Arc<dyn SearchIndexProvider>,
}

impl AggregationTranslator {
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self { provider }
    }

    /// Invoice revenue per interval: sum of `total_cents` per bucket.
    #[instrument(skip(self))]
    pub async fn invoice_revenue(
        &self,
        window: &ReportWindow,
        interval: &str,
    ) -> Result<HistogramReport, SyncError> {
        self.run(
            DocumentKind::Invoice,
            window,
            interval,
            HistogramMetric::Sum {
                field: "total_cents".to_string(),
            },
        )
        .await
    }

    /// User signups per interval: document count per bucket.
    #[instrument(skip(self))]
    pub async fn user_signups(
        &self,
        window: &ReportWindow,
        interval: &str,
    ) -> Result<HistogramReport, SyncError> {
        self.run(DocumentKind::User, window, interval, HistogramMetric::Count)
            .await
    }

    /// Validate, query, and reshape.
    ///
    /// The interval is parsed before anything touches the index: an unknown
    /// unit is a hard request error, never a guessed bucket width. Window
    /// bounds are validated the same way as search date filters.
    async fn run(
        &self,
        kind: DocumentKind,
        window: &ReportWindow,
        interval: &str,
        metric: HistogramMetric,
    ) -> Result<HistogramReport, SyncError> {
        let interval = CalendarInterval::from_str(interval)?;
        let mut clauses = Vec::new();
        if let Some(status) = &window.status {
            clauses.push(QueryClause::exact("status", status.as_str()));
        }
        clauses.extend(created_at_clause(
            window.from.as_deref(),
            window.to.as_deref(),
        )?);

        let query = HistogramQuery {
            clauses,
            interval,
            metric,
        };
        let response = self.provider.aggregate(kind, &query).await?;

        let mut total = 0.0;
        let mut buckets = Vec::with_capacity(response.buckets.len());
        for bucket in response.buckets {
            total += bucket.value;
            buckets.push(ReportBucket {
                end_time: interval.bucket_end(&bucket.key)?,
                start_time: bucket.key,
                total: bucket.value,
                count: bucket.doc_count,
            });
        }

        Ok(HistogramReport {
            from: window.from.clone(),
            to: window.to.clone(),
            interval,
            total,
            average: response.average,
            buckets,
        })
    }
}
