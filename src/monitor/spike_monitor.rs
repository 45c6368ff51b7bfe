/*!
 * Spike Monitor
 *
 * The alert loop: a [`CaptureLoop`] on `check_interval` whose snapshots pass
 * through spike detection before reaching the caller's sink. Overlap
 * handling and cancellation are the capture loop's.
 */

use super::alerts::{AlertSink, SpikeAlert};
use crate::config::CensusConfig;
use crate::core::limits::EVENT_CHANNEL_CAPACITY;
use crate::core::Result;
use crate::snapshot::{
    CaptureLoop, CycleGuard, LoopStats, MemoryProvider, Snapshot, SnapshotCapture, SnapshotSink,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Handle to a running alert loop
pub struct SpikeMonitor {
    capture_loop: CaptureLoop,
    sink: Arc<AlertSink>,
    alerts: broadcast::Sender<SpikeAlert>,
}

impl SpikeMonitor {
    /// Spawn on the current tokio runtime
    ///
    /// Uses `check_interval`, `individual_tracking`, the spike thresholds and
    /// the ignore list from `config`.
    pub fn spawn(
        capture: SnapshotCapture,
        provider: MemoryProvider,
        config: &CensusConfig,
        sink: Arc<dyn SnapshotSink>,
    ) -> Result<Self> {
        Self::spawn_guarded(capture, provider, config, sink, CycleGuard::new())
    }

    /// Spawn with checks sharing `guard` with other capture paths
    pub fn spawn_guarded(
        capture: SnapshotCapture,
        provider: MemoryProvider,
        config: &CensusConfig,
        sink: Arc<dyn SnapshotSink>,
        guard: CycleGuard,
    ) -> Result<Self> {
        config.validate()?;

        let (alerts, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let alert_sink = Arc::new(AlertSink::new(
            config.spike_rules(),
            config.ignore_list(),
            alerts.clone(),
            sink,
        ));

        let capture_loop = CaptureLoop::spawn_guarded(
            capture,
            provider,
            alert_sink.clone(),
            config.check_interval,
            config.individual_tracking,
            guard,
        )?;

        info!(
            instance_threshold = config.spike_instance_threshold,
            memory_threshold_mb = config.spike_memory_threshold_mb,
            ignored = config.ignore_fragments.len(),
            "Spike monitor started"
        );

        Ok(Self {
            capture_loop,
            sink: alert_sink,
            alerts,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SpikeAlert> {
        self.alerts.subscribe()
    }

    /// Run a check now instead of waiting for the next tick
    pub async fn check_now(&self) -> Result<Arc<Snapshot>> {
        self.capture_loop.capture_now().await
    }

    /// Alerts raised since spawning
    pub fn alerts_raised(&self) -> u64 {
        self.sink.raised()
    }

    pub fn stats(&self) -> LoopStats {
        self.capture_loop.stats()
    }

    /// Stop before the next check
    pub async fn shutdown(self) {
        self.capture_loop.shutdown().await;
        info!("Spike monitor stopped");
    }
}
