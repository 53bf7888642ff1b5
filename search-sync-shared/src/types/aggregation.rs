//! Calendar-interval histogram aggregation types.
//!
//! The aggregation translator buckets documents by `created_at` using a
//! calendar interval and reshapes the index store's bucketed response into a
//! uniform report. Bucket end times are derived client-side: start time plus
//! exactly one interval unit.

use chrono::{Duration, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::types::query::QueryClause;

/// Bucket-key date format, chrono syntax.
pub const BUCKET_KEY_FORMAT_CHRONO: &str = "%Y-%m-%dT%H:%M:%S";

/// Bucket-key date format in the index store's syntax; sent with the
/// histogram so bucket keys come back in a shape we can parse.
pub const BUCKET_KEY_FORMAT_INDEX: &str = "yyyy-MM-dd'T'HH:mm:ss";

/// Errors from aggregation translation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregationError {
    /// Interval unit outside hour/day/week/month. Always a hard error,
    /// never a guessed bucket width.
    #[error("Unsupported calendar interval: {0}")]
    UnsupportedInterval(String),

    /// Bucket key from the index store did not parse in the declared format.
    #[error("Invalid bucket key {key:?}: {message}")]
    InvalidBucketKey { key: String, message: String },
}

/// Histogram bucketing granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarInterval {
    Hour,
    Day,
    Week,
    Month,
}

impl CalendarInterval {
    /// The interval keyword understood by the index store's date histogram.
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarInterval::Hour => "hour",
            CalendarInterval::Day => "day",
            CalendarInterval::Week => "week",
            CalendarInterval::Month => "month",
        }
    }

    /// Compute a bucket's end time from its start time: start plus one
    /// interval unit, in the bucket-key format.
    pub fn bucket_end(&self, start: &str) -> Result<String, AggregationError> {
        let parsed = NaiveDateTime::parse_from_str(start, BUCKET_KEY_FORMAT_CHRONO).map_err(
            |e| AggregationError::InvalidBucketKey {
                key: start.to_string(),
                message: e.to_string(),
            },
        )?;

        let end = match self {
            CalendarInterval::Hour => parsed + Duration::hours(1),
            CalendarInterval::Day => parsed + Duration::days(1),
            CalendarInterval::Week => parsed + Duration::days(7),
            CalendarInterval::Month => parsed.checked_add_months(Months::new(1)).ok_or_else(
                || AggregationError::InvalidBucketKey {
                    key: start.to_string(),
                    message: "month addition out of range".to_string(),
                },
            )?,
        };

        Ok(end.format(BUCKET_KEY_FORMAT_CHRONO).to_string())
    }
}

impl FromStr for CalendarInterval {
    type Err = AggregationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(CalendarInterval::Hour),
            "day" => Ok(CalendarInterval::Day),
            "week" => Ok(CalendarInterval::Week),
            "month" => Ok(CalendarInterval::Month),
            other => Err(AggregationError::UnsupportedInterval(other.to_string())),
        }
    }
}

impl std::fmt::Display for CalendarInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The per-bucket summary metric the histogram computes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistogramMetric {
    /// Sum of a numeric field per bucket (e.g. invoice revenue).
    Sum { field: String },
    /// Plain document count per bucket.
    Count,
}

/// A histogram aggregation request against one index: conjunctive filter
/// clauses, the bucketing interval, and the per-bucket metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramQuery {
    pub clauses: Vec<QueryClause>,
    pub interval: CalendarInterval,
    pub metric: HistogramMetric,
}

/// One raw bucket from the index store, before end-time derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    /// Bucket start time in the bucket-key format.
    pub key: String,
    pub doc_count: u64,
    /// The per-bucket metric value (sum, or doc count for count metrics).
    pub value: f64,
}

/// The index store's bucketed aggregation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramResponse {
    pub buckets: Vec<HistogramBucket>,
    /// Average of the per-bucket metric across all buckets.
    pub average: f64,
}

/// One reshaped report bucket with a derived end time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBucket {
    pub start_time: String,
    pub end_time: String,
    pub total: f64,
    pub count: u64,
}

/// The final aggregation report: requested window, interval, overall total
/// and average, and the per-bucket breakdown in bucket order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub interval: CalendarInterval,
    pub total: f64,
    pub average: f64,
    pub buckets: Vec<ReportBucket>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_end_per_unit() {
        let start = "2024-03-01T00:00:00";
        assert_eq!(
            CalendarInterval::Hour.bucket_end(start).unwrap(),
            "2024-03-01T01:00:00"
        );
        assert_eq!(
            CalendarInterval::Day.bucket_end(start).unwrap(),
            "2024-03-02T00:00:00"
        );
        assert_eq!(
            CalendarInterval::Week.bucket_end(start).unwrap(),
            "2024-03-08T00:00:00"
        );
        assert_eq!(
            CalendarInterval::Month.bucket_end(start).unwrap(),
            "2024-04-01T00:00:00"
        );
    }

    #[test]
    fn test_bucket_end_month_clamps_to_shorter_month() {
        // One calendar month after Jan 31 is Feb 29 in a leap year.
        assert_eq!(
            CalendarInterval::Month.bucket_end("2024-01-31T12:00:00").unwrap(),
            "2024-02-29T12:00:00"
        );
    }

    #[test]
    fn test_bucket_end_rejects_bad_key() {
        let result = CalendarInterval::Day.bucket_end("March 1st");
        assert!(matches!(
            result,
            Err(AggregationError::InvalidBucketKey { .. })
        ));
    }

    #[test]
    fn test_interval_parsing() {
        assert_eq!("day".parse::<CalendarInterval>().unwrap(), CalendarInterval::Day);
        assert_eq!("WEEK".parse::<CalendarInterval>().unwrap(), CalendarInterval::Week);
        let err = "fortnight".parse::<CalendarInterval>().unwrap_err();
        assert_eq!(
            err,
            AggregationError::UnsupportedInterval("fortnight".to_string())
        );
    }
}
