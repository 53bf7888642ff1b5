//! Shared type definitions for the search-sync pipeline.

pub mod aggregation;
pub mod document;
pub mod envelope;
pub mod query;
pub mod request;
pub mod sort;
