/*!
 * Watch Scheduler
 *
 * Named, independently-timed polls of a single type's live count. Each
 * watch is its own tokio task: it takes a baseline when started, then on
 * every tick re-counts the type straight from the registry, classifies the
 * change and publishes a [`WatchEvent`]. What happens to the events is up
 * to the subscribers.
 *
 * Stopping a watch takes effect before its next tick. A poll already in
 * progress finishes. Dropping the scheduler stops every watch.
 */

use super::types::{WatchEvent, WatchHandle, WatchState, WatchedType};
use crate::analysis::diff::signed_delta;
use crate::analysis::{SpikeClassifier, TrendStatus};
use crate::core::limits::EVENT_CHANNEL_CAPACITY;
use crate::core::types::TypeKey;
use crate::core::{CensusError, Result, ShardManager, WorkloadProfile};
use crate::registry::WeakRegistry;
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{broadcast, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

type SharedRecord = Arc<Mutex<WatchedType>>;

struct ActiveWatch {
    record: SharedRecord,
    stop_tx: oneshot::Sender<()>,
}

/// State one watch task needs
struct WatchTask {
    key: TypeKey,
    registry: Arc<WeakRegistry>,
    classifier: SpikeClassifier,
    record: SharedRecord,
    events: broadcast::Sender<WatchEvent>,
}

impl WatchTask {
    fn poll(&self) {
        let count = self.registry.live_count(&self.key);

        let event = {
            let mut record = self.record.lock();
            let delta = signed_delta(record.last_count, count);
            let status = self.classifier.classify(delta);

            record.last_count = count;
            record.last_delta = delta;
            record.last_status = status;
            record.polls += 1;

            WatchEvent {
                watch_id: record.id,
                key: self.key.clone(),
                count,
                delta,
                status,
                poll: record.polls,
                timestamp: SystemTime::now(),
            }
        };

        match event.status {
            TrendStatus::Leaking => {
                warn!(type_key = %self.key, count, delta = event.delta, "Possible leak")
            }
            status => {
                debug!(type_key = %self.key, count, delta = event.delta, %status, "Watch poll")
            }
        }

        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

async fn run_watch(task: WatchTask, interval: Duration, mut stop_rx: oneshot::Receiver<()>) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // Stop first so a due tick never runs after cancellation
            biased;

            _ = &mut stop_rx => break,
            _ = ticker.tick() => task.poll(),
        }
    }

    debug!(type_key = %task.key, "Watch task finished");
}

/// Registry of active watches
pub struct WatchScheduler {
    registry: Arc<WeakRegistry>,
    classifier: SpikeClassifier,
    watches: DashMap<TypeKey, ActiveWatch, RandomState>,
    events: broadcast::Sender<WatchEvent>,
}

impl WatchScheduler {
    pub fn new(registry: Arc<WeakRegistry>, classifier: SpikeClassifier) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            registry,
            classifier,
            watches: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                ShardManager::shards(WorkloadProfile::LowContention),
            ),
            events,
        }
    }

    /// Start polling `key` every `interval`
    ///
    /// The first poll happens one interval after this returns.
    pub fn start_watch(&self, key: impl Into<TypeKey>, interval: Duration) -> Result<WatchHandle> {
        let key = key.into();
        if interval.is_zero() {
            return Err(CensusError::InvalidInterval(key));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| CensusError::NoRuntime)?;

        let slot = match self.watches.entry(key.clone()) {
            Entry::Occupied(_) => {
                debug!(type_key = %key, "Watch already active");
                return Err(CensusError::AlreadyWatching(key));
            }
            Entry::Vacant(slot) => slot,
        };

        let handle = WatchHandle {
            id: Uuid::new_v4(),
            key: key.clone(),
            interval,
        };
        let baseline = self.registry.live_count(&key);
        let record = Arc::new(Mutex::new(WatchedType::new(&handle, baseline)));
        let (stop_tx, stop_rx) = oneshot::channel();

        let task = WatchTask {
            key: key.clone(),
            registry: Arc::clone(&self.registry),
            classifier: self.classifier,
            record: Arc::clone(&record),
            events: self.events.clone(),
        };
        runtime.spawn(run_watch(task, interval, stop_rx));
        slot.insert(ActiveWatch { record, stop_tx });

        info!(
            type_key = %key,
            watch_id = %handle.id,
            interval_secs = interval.as_secs_f64(),
            baseline,
            "Watch started"
        );
        Ok(handle)
    }

    /// Stop the watch on `key`, returning its final record
    pub fn stop_watch(&self, key: &str) -> Result<WatchedType> {
        let Some((key, watch)) = self.watches.remove(key) else {
            return Err(CensusError::NotWatched(TypeKey::new(key)));
        };

        // The task may already be gone if the runtime shut down
        let _ = watch.stop_tx.send(());

        let mut record = watch.record.lock();
        record.state = WatchState::Stopped;
        info!(type_key = %key, polls = record.polls, "Watch stopped");
        Ok(record.clone())
    }

    /// Stop every watch, returning how many were active
    pub fn stop_all(&self) -> usize {
        let keys: Vec<TypeKey> = self.watches.iter().map(|e| e.key().clone()).collect();
        let stopped = keys
            .iter()
            .filter(|key| self.stop_watch(key.as_str()).is_ok())
            .count();

        if stopped > 0 {
            info!(stopped, "All watches stopped");
        }
        stopped
    }

    /// Records of the active watches, by key
    pub fn watched(&self) -> Vec<WatchedType> {
        let mut records: Vec<WatchedType> = self
            .watches
            .iter()
            .map(|entry| entry.value().record.lock().clone())
            .collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }

    pub fn get(&self, key: &str) -> Option<WatchedType> {
        self.watches
            .get(key)
            .map(|entry| entry.value().record.lock().clone())
    }

    pub fn is_watching(&self, key: &str) -> bool {
        self.watches.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// Receive an event for every poll of every watch
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for WatchScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchScheduler")
            .field("watches", &self.watches.len())
            .field("classifier", &self.classifier)
            .finish()
    }
}
