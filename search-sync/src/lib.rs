//! # Search Sync
//!
//! Search-index synchronization pipeline for the storefront backend. Keeps
//! OpenSearch consistent with the relational systems-of-record owned by the
//! catalog, accounts, and billing services.
//!
//! ## Architecture
//!
//! 1. **Publisher**: owning services publish change events on named
//!    broadcast channels, one per (entity kind, operation)
//! 2. **Bootstrap**: a one-time full load builds each index from a snapshot
//!    of the owning service's data
//! 3. **Listeners**: one loop per channel applies incremental changes
//! 4. **Translators**: flat read requests become structured index queries
//!    and histogram reports
//! 5. **Orchestrator**: coordinates startup, supervision, and shutdown
//!
//! ## Modules
//!
//! - [`bus`]: Broadcast bus and change publisher
//! - [`source`]: Snapshot source for the bootstrap load
//! - [`bootstrap`]: One-time full index load
//! - [`listener`]: Incremental indexer loops
//! - [`query`]: Query and aggregation translators
//! - [`config`]: Configuration and dependency initialization
//! - [`orchestrator`]: Coordinates the sync flow
//! - [`errors`]: Error types for the pipeline

pub mod bootstrap;
pub mod bus;
pub mod config;
pub mod errors;
pub mod listener;
pub mod orchestrator;
pub mod query;
pub mod source;

pub use config::Dependencies;
pub use errors::SyncError;

use thiserror::Error;

/// Errors that can occur during service initialization or execution.
#[derive(Error, Debug)]
pub enum SearchSyncError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Sync pipeline error.
    #[error("Sync error: {0}")]
    SyncError(#[from] SyncError),
}

impl SearchSyncError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
