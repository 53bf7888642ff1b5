//! OpenSearch backend implementation.

pub mod dsl;
pub mod index_config;
mod provider;

pub use provider::OpenSearchProvider;
