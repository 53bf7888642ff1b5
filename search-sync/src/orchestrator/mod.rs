//! Orchestrator for the search-sync service.
//!
//! Wires the pipeline together: verifies the index store answers, spawns the
//! listener loops (subscribing before the bootstrap so no gap opens between
//! the snapshot fetch and incremental coverage), runs the bootstrap, then
//! sits in the supervision loop until shutdown.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{error, info, instrument, warn};

use crate::bootstrap::BootstrapIndexer;
use crate::bus::ChannelBus;
use crate::errors::SyncError;
use crate::listener::{spawn_listeners, ListenerCounters};
use crate::source::SnapshotSource;
use search_sync_repository::SearchIndexProvider;
use search_sync_shared::DocumentKind;

/// Seconds between progress log lines.
const PROGRESS_INTERVAL_SECS: u64 = 10;

/// Orchestrator that coordinates the sync components.
///
/// The orchestrator:
/// - Verifies the index store is reachable before anything else
/// - Spawns one listener loop per broadcast channel
/// - Runs the one-time bootstrap load
/// - Handles shutdown signals and drains the loops
pub struct Orchestrator {
    bus: Arc<ChannelBus>,
    provider: Arc<dyn SearchIndexProvider>,
    bootstrap: BootstrapIndexer,
    counters: Arc<ListenerCounters>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    /// Create an orchestrator over the given bus, index provider, and
    /// snapshot source.
    pub fn new(
        bus: Arc<ChannelBus>,
        provider: Arc<dyn SearchIndexProvider>,
        source: Arc<dyn SnapshotSource>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let bootstrap = BootstrapIndexer::new(provider.clone(), source);

        Self {
            bus,
            provider,
            bootstrap,
            counters: Arc::new(ListenerCounters::default()),
            shutdown_tx,
        }
    }

    /// Run the orchestrator.
    ///
    /// Blocks until a shutdown signal is received or startup fails. An index
    /// that already exists at bootstrap time is reported and left alone; the
    /// service continues with incremental sync over the existing index.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<(), SyncError> {
        info!("Starting search-sync orchestrator");

        self.provider.ping().await?;

        // Subscriptions happen inside spawn_listeners, so every change
        // published from here on is covered.
        let handles = spawn_listeners(
            &self.bus,
            self.provider.clone(),
            self.counters.clone(),
            &self.shutdown_tx,
        )?;

        if let Err(e) = self.run_bootstrap().await {
            error!(error = %e, "Bootstrap failed, shutting down");
            self.drain(handles).await;
            return Err(e);
        }

        info!("Ready, processing incremental changes");
        self.supervise().await;
        self.drain(handles).await;
        Ok(())
    }

    /// Bootstrap every index. An already-present index is a reported
    /// anomaly, not a startup failure.
    async fn run_bootstrap(&self) -> Result<(), SyncError> {
        for kind in DocumentKind::ALL {
            match self.bootstrap.run(kind).await {
                Ok(report) => {
                    info!(kind = %kind, indexed = report.indexed, "Index bootstrapped");
                }
                Err(SyncError::IndexAlreadyExists(index)) => {
                    warn!(index, "Index already present, continuing with incremental sync");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Supervision loop: progress logging until ctrl-c or programmatic
    /// shutdown.
    async fn supervise(&self) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut progress_timer = interval(Duration::from_secs(PROGRESS_INTERVAL_SECS));
        progress_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; swallow it.
        progress_timer.tick().await;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Programmatic shutdown requested");
                    break;
                }
                _ = progress_timer.tick() => {
                    let (upserts, deletes, skipped) = self.counters.snapshot();
                    info!(upserts, deletes, skipped, "Sync progress");
                }
            }
        }
    }

    /// Stop the listener loops and wait for them to finish.
    async fn drain(&self, handles: Vec<JoinHandle<()>>) {
        self.bus.close();
        let _ = self.shutdown_tx.send(());
        for handle in handles {
            let _ = handle.await;
        }

        let (upserts, deletes, skipped) = self.counters.snapshot();
        info!(
            total_upserts = upserts,
            total_deletes = deletes,
            total_skipped = skipped,
            "Orchestrator shutdown complete"
        );
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Running listener totals since startup.
    pub fn counters(&self) -> Arc<ListenerCounters> {
        self.counters.clone()
    }
}
