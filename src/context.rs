/*!
 * Census Context
 *
 * Owns one census: registry, size estimator, capture, snapshot history and
 * watch scheduler, all built from a single [`CensusConfig`]. Cheap to clone;
 * clones share state. There is no global instance: hosts keep the context
 * wherever they keep the rest of their process state and tear it down with
 * [`CensusContext::shutdown`].
 */

use crate::analysis::{diff_ordered, DiffOrder, TypeDelta};
use crate::config::CensusConfig;
use crate::core::{CensusError, Result};
use crate::monitor::SpikeMonitor;
use crate::registry::{Trackable, WeakRegistry};
use crate::sizing::{SizeEstimator, SizeOracle};
use crate::snapshot::{CycleGuard, MemoryProvider, Snapshot, SnapshotCapture, SnapshotHistory};
use crate::watch::{WatchHandle, WatchScheduler};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

struct Inner {
    config: CensusConfig,
    capture: SnapshotCapture,
    history: Arc<SnapshotHistory>,
    guard: CycleGuard,
    watches: WatchScheduler,
}

#[derive(Clone)]
pub struct CensusContext {
    inner: Arc<Inner>,
}

impl CensusContext {
    /// Build a context; fails if `config` does not validate
    pub fn new(config: CensusConfig, oracle: Arc<dyn SizeOracle>) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(WeakRegistry::new());
        let estimator = Arc::new(SizeEstimator::new(oracle));
        let capture = SnapshotCapture::new(Arc::clone(&registry), estimator);
        let history = Arc::new(SnapshotHistory::new(config.history_capacity));
        let watches = WatchScheduler::new(registry, config.classifier());

        info!(
            history_capacity = config.history_capacity,
            individual_tracking = config.individual_tracking,
            "Census context created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                capture,
                history,
                guard: CycleGuard::new(),
                watches,
            }),
        })
    }

    pub fn config(&self) -> &CensusConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<WeakRegistry> {
        self.inner.capture.registry()
    }

    pub fn estimator(&self) -> &Arc<SizeEstimator> {
        self.inner.capture.estimator()
    }

    pub fn capture(&self) -> &SnapshotCapture {
        &self.inner.capture
    }

    pub fn history(&self) -> &Arc<SnapshotHistory> {
        &self.inner.history
    }

    pub fn watches(&self) -> &WatchScheduler {
        &self.inner.watches
    }

    /// Track an object in this context's registry
    pub fn register<T: Trackable>(&self, object: &Arc<T>) -> bool {
        self.registry().register(object)
    }

    /// Capture now on the calling thread and append to the history
    ///
    /// Blocks for as long as `total_memory` does. Shares the overlap guard
    /// of monitors spawned from this context: fails with
    /// [`CensusError::CaptureInProgress`] while one of their checks runs.
    pub fn snapshot<F>(&self, total_memory: F) -> Result<Arc<Snapshot>>
    where
        F: FnOnce() -> Result<u64>,
    {
        let Some(_permit) = self.inner.guard.try_enter() else {
            debug!("Manual capture skipped, another cycle is running");
            return Err(CensusError::CaptureInProgress);
        };

        let snapshot = Arc::new(
            self.inner
                .capture
                .capture(self.inner.config.individual_tracking, total_memory)?,
        );
        self.inner.history.push(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Diff of the two most recent snapshots in the history
    pub fn latest_diff(&self, order: DiffOrder) -> Option<Vec<TypeDelta>> {
        self.inner
            .history
            .last_pair()
            .map(|(a, b)| diff_ordered(&a, &b, order))
    }

    pub fn start_watch(&self, key: &str, interval: Duration) -> Result<WatchHandle> {
        self.inner.watches.start_watch(key, interval)
    }

    /// Start the alert loop, storing its snapshots in this context's history
    pub fn spawn_monitor(&self, provider: MemoryProvider) -> Result<SpikeMonitor> {
        SpikeMonitor::spawn_guarded(
            self.inner.capture.clone(),
            provider,
            &self.inner.config,
            self.inner.history.clone(),
            self.inner.guard.clone(),
        )
    }

    /// Stop every watch and forget every tracked object
    ///
    /// Monitors are owned by the caller and shut down separately.
    pub fn shutdown(&self) {
        let watches = self.inner.watches.stop_all();
        self.registry().clear();
        info!(watches, "Census context shut down");
    }
}

impl std::fmt::Debug for CensusContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CensusContext")
            .field("config", &self.inner.config)
            .field("snapshots", &self.inner.history.len())
            .field("watches", &self.inner.watches.len())
            .finish()
    }
}
