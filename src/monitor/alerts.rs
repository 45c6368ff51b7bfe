/*!
 * Spike Alerts
 *
 * Sink decorator that compares every stored snapshot with the one before
 * it and publishes a [`SpikeAlert`] per spike before passing the snapshot on.
 */

use crate::analysis::{detect_spikes, IgnoreList, Spike, SpikeRules};
use crate::core::serde::{serde_as, TimestampMilliSeconds};
use crate::snapshot::{Snapshot, SnapshotSink};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::warn;

/// One spike between two consecutive captures
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SpikeAlert {
    pub spike: Spike,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub previous: SystemTime,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub current: SystemTime,
}

pub(crate) struct AlertSink {
    rules: SpikeRules,
    ignore: IgnoreList,
    previous: Mutex<Option<Arc<Snapshot>>>,
    alerts: broadcast::Sender<SpikeAlert>,
    raised: AtomicU64,
    inner: Arc<dyn SnapshotSink>,
}

impl AlertSink {
    pub(crate) fn new(
        rules: SpikeRules,
        ignore: IgnoreList,
        alerts: broadcast::Sender<SpikeAlert>,
        inner: Arc<dyn SnapshotSink>,
    ) -> Self {
        Self {
            rules,
            ignore,
            previous: Mutex::new(None),
            alerts,
            raised: AtomicU64::new(0),
            inner,
        }
    }

    pub(crate) fn raised(&self) -> u64 {
        self.raised.load(Ordering::Relaxed)
    }

    fn check(&self, previous: &Snapshot, current: &Snapshot) {
        let spikes = detect_spikes(previous, current, &self.rules, &self.ignore);
        if spikes.is_empty() {
            return;
        }

        self.raised.fetch_add(spikes.len() as u64, Ordering::Relaxed);
        for spike in spikes {
            warn!(
                type_key = %spike.delta.key,
                delta = spike.delta.delta,
                bytes_delta = spike.delta.bytes_delta,
                trigger = ?spike.trigger,
                "Population spike"
            );
            let _ = self.alerts.send(SpikeAlert {
                spike,
                previous: previous.timestamp(),
                current: current.timestamp(),
            });
        }
    }
}

impl SnapshotSink for AlertSink {
    fn store(&self, snapshot: Arc<Snapshot>) {
        let previous = self.previous.lock().replace(Arc::clone(&snapshot));
        if let Some(previous) = previous {
            self.check(&previous, &snapshot);
        }
        self.inner.store(snapshot);
    }
}
