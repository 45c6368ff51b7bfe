/*!
 * Snapshot History
 * Destination for periodically captured snapshots
 */

use super::types::Snapshot;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// Receives captured snapshots
///
/// Persistence is up to the implementor; the census only hands snapshots over.
pub trait SnapshotSink: Send + Sync {
    fn store(&self, snapshot: Arc<Snapshot>);
}

/// Bounded in-memory history, oldest evicted first
#[derive(Debug)]
pub struct SnapshotHistory {
    capacity: usize,
    snapshots: RwLock<VecDeque<Arc<Snapshot>>>,
}

impl SnapshotHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            snapshots: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn push(&self, snapshot: Arc<Snapshot>) {
        let mut snapshots = self.snapshots.write();
        if snapshots.len() == self.capacity {
            snapshots.pop_front();
        }
        snapshots.push_back(snapshot);
        trace!(len = snapshots.len(), "Snapshot stored in history");
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.snapshots.read().back().cloned()
    }

    /// The two most recent snapshots, older first
    pub fn last_pair(&self) -> Option<(Arc<Snapshot>, Arc<Snapshot>)> {
        let snapshots = self.snapshots.read();
        let n = snapshots.len();
        if n < 2 {
            return None;
        }
        Some((Arc::clone(&snapshots[n - 2]), Arc::clone(&snapshots[n - 1])))
    }

    /// All retained snapshots, oldest first
    pub fn to_vec(&self) -> Vec<Arc<Snapshot>> {
        self.snapshots.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.snapshots.write().clear();
    }
}

impl SnapshotSink for SnapshotHistory {
    fn store(&self, snapshot: Arc<Snapshot>) {
        self.push(snapshot);
    }
}
