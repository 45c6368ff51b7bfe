/*!
 * Snapshot Capture
 *
 * Freezes the registry's current population into a [`Snapshot`]:
 *
 * 1. ask the host for its total managed memory (it may run a full
 *    collection first; the figure is assumed to reflect live state after it)
 * 2. read live counts, or live objects when per-instance detail is wanted
 * 3. attach per-type size estimates
 *
 * Capture never mutates the registry beyond dead-handle pruning. A failing
 * provider or a panicking `Trackable` hook abandons the cycle with
 * [`CensusError::CaptureFailed`]; caches and stored snapshots are untouched.
 */

use super::types::{InstanceInfo, Snapshot};
use crate::core::types::TypeKey;
use crate::core::{CensusError, Result};
use crate::registry::handle::identity_of;
use crate::registry::{Trackable, WeakRegistry};
use crate::sizing::SizeEstimator;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tracing::{debug, info_span, warn};
use uuid::Uuid;

/// Host-supplied total managed memory figure
pub type MemoryProvider = Arc<dyn Fn() -> Result<u64> + Send + Sync>;

/// Builds snapshots from a registry and a size estimator
#[derive(Clone)]
pub struct SnapshotCapture {
    registry: Arc<WeakRegistry>,
    estimator: Arc<SizeEstimator>,
}

impl SnapshotCapture {
    pub fn new(registry: Arc<WeakRegistry>, estimator: Arc<SizeEstimator>) -> Self {
        Self {
            registry,
            estimator,
        }
    }

    pub fn registry(&self) -> &Arc<WeakRegistry> {
        &self.registry
    }

    pub fn estimator(&self) -> &Arc<SizeEstimator> {
        &self.estimator
    }

    /// Capture the current population
    pub fn capture<F>(&self, individual_tracking: bool, total_memory: F) -> Result<Snapshot>
    where
        F: FnOnce() -> Result<u64>,
    {
        let cycle = Uuid::new_v4();
        let span = info_span!("capture", %cycle, individual_tracking);
        let _entered = span.enter();
        let start = Instant::now();

        let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<Snapshot> {
            let total = total_memory()?;
            Ok(self.build(individual_tracking, total))
        }))
        .unwrap_or_else(|panic| Err(CensusError::CaptureFailed(panic_message(&*panic))));

        match outcome {
            Ok(snapshot) => {
                debug!(
                    types = snapshot.counts().len(),
                    instances = snapshot.total_instances(),
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "Snapshot captured"
                );
                Ok(snapshot)
            }
            Err(err) => {
                let err = match err {
                    CensusError::CaptureFailed(_) => err,
                    other => CensusError::CaptureFailed(other.to_string()),
                };
                warn!(error = %err, "Capture cycle abandoned");
                Err(err)
            }
        }
    }

    fn build(&self, individual_tracking: bool, total_memory: u64) -> Snapshot {
        // Counts and instance detail come from one registry read so they agree
        let (counts, instances) = if individual_tracking {
            let objects = self.registry.live_objects_by_type();
            let counts: BTreeMap<TypeKey, u64> = objects
                .iter()
                .map(|(key, live)| (key.clone(), live.len() as u64))
                .collect();
            let instances: BTreeMap<TypeKey, Vec<InstanceInfo>> = objects
                .into_iter()
                .map(|(key, live)| (key, live.iter().map(project).collect()))
                .collect();
            (counts, Some(instances))
        } else {
            (self.registry.live_counts(), None)
        };

        let sizes = counts
            .keys()
            .map(|key| (key.clone(), self.estimator.estimate(key)))
            .collect();

        Snapshot::new(SystemTime::now(), total_memory, counts, sizes, instances)
    }
}

/// Per-instance detail: position if any, id with optional label, else identity hash
fn project(object: &Arc<dyn Trackable>) -> InstanceInfo {
    let id = match (object.instance_id(), object.label()) {
        (Some(id), Some(label)) => format!("{} ({})", id, label),
        (Some(id), None) => id,
        (None, Some(label)) => format!("#{:x} ({})", identity_of(object), label),
        (None, None) => format!("#{:x}", identity_of(object)),
    };

    InstanceInfo {
        id,
        position: object.position(),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during capture".to_string()
    }
}
