//! The dashboard panel and its refresh loop
//!
//! A mounted panel runs one task that alternates between fetching the active
//! keys and waiting out the refresh delay. Every state change is published as
//! an immutable [`PanelSnapshot`] on a watch channel; the returned
//! [`PanelHandle`] stops the loop explicitly or when dropped.

use crate::{
    client::{BackendClient, KeySource},
    error::{DashboardError, Result},
    snapshot::{Phase, PanelSnapshot},
};
use chrono::{DateTime, Utc};
use keymon_core::{Config, PanelConfig};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Counters kept by the refresh loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelStats {
    /// Refresh cycles that settled, successful or not
    pub cycles: u64,

    /// Cycles whose fetch failed and fell back to an empty list
    pub failures: u64,

    /// When the last successful fetch settled
    pub last_success_at: Option<DateTime<Utc>>,
}

/// Result of one refresh cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Keys to show: the response verbatim, or empty on failure
    pub keys: Vec<String>,

    /// Whether the fetch succeeded
    pub succeeded: bool,
}

/// Fetch the active keys once, swallowing any failure
///
/// A failed fetch is logged and yields an empty key list.
pub async fn refresh_keys(source: &dyn KeySource) -> RefreshOutcome {
    match source.active_keys().await {
        Ok(keys) => RefreshOutcome {
            keys,
            succeeded: true,
        },
        Err(e) => {
            warn!(error = %e, "Refreshing active keys failed, showing no keys");
            RefreshOutcome {
                keys: Vec::new(),
                succeeded: false,
            }
        }
    }
}

/// Dashboard panel listing the active keys
pub struct DashboardPanel {
    source: Arc<dyn KeySource>,
    config: PanelConfig,
}

impl std::fmt::Debug for DashboardPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardPanel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DashboardPanel {
    /// Create a panel reading keys from `source`
    #[must_use]
    pub fn new(source: Arc<dyn KeySource>, config: PanelConfig) -> Self {
        Self { source, config }
    }

    /// Create a panel backed by the HTTP backend described in `config`
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError`] if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let client = BackendClient::new(config.backend.clone())?;
        Ok(Self::new(Arc::new(client), config.panel.clone()))
    }

    /// Delay between a settled refresh and the next one
    #[must_use]
    pub const fn refresh_delay(&self) -> Duration {
        self.config.refresh_delay()
    }

    /// Start the refresh loop
    ///
    /// The first fetch is issued immediately.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use = "dropping the handle stops the panel"]
    pub fn mount(self) -> PanelHandle {
        let (snapshot_tx, snapshot_rx) = watch::channel(PanelSnapshot::initial());
        let stats = Arc::new(RwLock::new(PanelStats::default()));
        let cancel = CancellationToken::new();

        info!(
            refresh_delay_ms = u64::try_from(self.refresh_delay().as_millis()).unwrap_or(u64::MAX),
            "Mounting dashboard panel"
        );

        let task = tokio::spawn(run_refresh_loop(
            self.source,
            self.config.refresh_delay(),
            snapshot_tx,
            Arc::clone(&stats),
            cancel.clone(),
        ));

        PanelHandle {
            snapshots: snapshot_rx,
            stats,
            cancel,
            task: Some(task),
        }
    }
}

/// Handle to a mounted panel
///
/// Dropping the handle cancels the loop without waiting for it.
#[derive(Debug)]
pub struct PanelHandle {
    snapshots: watch::Receiver<PanelSnapshot>,
    stats: Arc<RwLock<PanelStats>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PanelHandle {
    /// Receiver that yields every published snapshot
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PanelSnapshot> {
        self.snapshots.clone()
    }

    /// Latest published snapshot
    #[must_use]
    pub fn snapshot(&self) -> PanelSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Loop counters
    #[must_use]
    pub fn stats(&self) -> PanelStats {
        self.stats.read().clone()
    }

    /// Whether the refresh loop is still running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the loop and wait for the task to exit
    ///
    /// Nothing is published and no request is issued once this returns.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Shutdown`] if the loop task panicked.
    #[instrument(skip(self))]
    pub async fn stop(mut self) -> Result<()> {
        self.cancel.cancel();

        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| DashboardError::shutdown(e.to_string()))?;
        }

        info!("Dashboard panel stopped");
        Ok(())
    }
}

impl Drop for PanelHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[instrument(skip_all)]
async fn run_refresh_loop(
    source: Arc<dyn KeySource>,
    delay: Duration,
    snapshot_tx: watch::Sender<PanelSnapshot>,
    stats: Arc<RwLock<PanelStats>>,
    cancel: CancellationToken,
) {
    let mut snapshot = PanelSnapshot::initial().with_phase(Phase::Fetching);

    loop {
        if cancel.is_cancelled() {
            break;
        }
        snapshot_tx.send_replace(snapshot.clone());
        debug!(refresh_token = %snapshot.refresh_token, "Refreshing dashboard");

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            outcome = refresh_keys(source.as_ref()) => outcome,
        };

        // a stop that raced the fetch wins; the result is discarded
        if cancel.is_cancelled() {
            break;
        }

        {
            let mut stats = stats.write();
            stats.cycles += 1;
            if outcome.succeeded {
                stats.last_success_at = Some(Utc::now());
            } else {
                stats.failures += 1;
            }
        }

        snapshot = snapshot.settled(outcome.keys);
        snapshot_tx.send_replace(snapshot.clone());
        debug!(
            refresh_token = %snapshot.refresh_token,
            keys = snapshot.keys.len(),
            "Dashboard refreshed"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        snapshot = snapshot.advanced();
    }

    debug!("Dashboard refresh loop exited");
}
