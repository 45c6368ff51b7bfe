/*!
 * Weak Registry
 *
 * Process-wide table of live objects, grouped by [`TypeKey`].
 *
 * ## Concurrency
 *
 * - The bucket table is a sharded `DashMap`; its shard lock is held only
 *   long enough to find or insert a bucket
 * - Each bucket has its own lock, so registrations of unrelated types never
 *   block each other and a long read of one type never stalls another
 *
 * ## Pruning
 *
 * The registry is append-only between reads. Dead handles are dropped only
 * by the read paths (`live_counts`, `live_count`, `live_objects_by_type`)
 * or by `clear`. A read that leaves a bucket empty removes it from the
 * table, so keys derived from per-object data do not accumulate. Removal
 * marks the bucket retired under its own lock; a registration that raced
 * the removal sees the mark and retries against a fresh bucket.
 */

use super::handle::{identity_of, WeakHandle};
use super::traits::Trackable;
use crate::core::types::TypeKey;
use crate::core::{ShardManager, WorkloadProfile};
use ahash::{HashSet, HashSetExt, RandomState};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Handles for one type key, in registration order
#[derive(Debug)]
struct Bucket {
    handles: Vec<WeakHandle>,
    identities: HashSet<usize>,
    /// Removed from the table; must not take new handles
    retired: bool,
}

impl Bucket {
    fn new() -> Self {
        Self {
            handles: Vec::new(),
            identities: HashSet::new(),
            retired: false,
        }
    }

    /// Insert unless this identity is already present
    fn insert(&mut self, handle: WeakHandle) -> bool {
        if !self.identities.insert(handle.identity()) {
            return false;
        }
        self.handles.push(handle);
        true
    }

    /// Drop dead handles, returning how many were removed
    fn prune(&mut self) -> usize {
        let before = self.handles.len();
        let identities = &mut self.identities;
        self.handles.retain(|handle| {
            let alive = handle.is_alive();
            if !alive {
                identities.remove(&handle.identity());
            }
            alive
        });

        if self.handles.len() < self.handles.capacity() / 4 {
            self.handles.shrink_to_fit();
            self.identities.shrink_to_fit();
        }
        before - self.handles.len()
    }
}

type SharedBucket = Arc<Mutex<Bucket>>;

/// Registry counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistryStats {
    pub registered: u64,
    pub duplicates_ignored: u64,
    pub pruned: u64,
    pub buckets_retired: u64,
    pub buckets: usize,
}

/// Weak-tracking population registry
pub struct WeakRegistry {
    buckets: DashMap<TypeKey, SharedBucket, RandomState>,
    registered: AtomicU64,
    duplicates: AtomicU64,
    pruned: AtomicU64,
    retired: AtomicU64,
}

impl WeakRegistry {
    pub fn new() -> Self {
        Self {
            buckets: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                ShardManager::shards(WorkloadProfile::HighContention),
            ),
            registered: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            pruned: AtomicU64::new(0),
            retired: AtomicU64::new(0),
        }
    }

    /// Start tracking an object
    ///
    /// Returns `false` if this exact object is already tracked. Safe to call
    /// from any number of threads.
    pub fn register<T: Trackable>(&self, object: &Arc<T>) -> bool {
        let key = object.type_key();
        let identity = identity_of(object);

        loop {
            let bucket = self.bucket(&key);
            let mut guard = bucket.lock();
            if guard.retired {
                continue;
            }

            // Cheap check first: duplicate calls must not allocate a handle
            if guard.identities.contains(&identity) {
                drop(guard);
                self.duplicates.fetch_add(1, Ordering::Relaxed);
                trace!(type_key = %key, "Duplicate registration ignored");
                return false;
            }

            let inserted = guard.insert(WeakHandle::new(object));
            drop(guard);

            if inserted {
                self.registered.fetch_add(1, Ordering::Relaxed);
            }
            return inserted;
        }
    }

    /// Register an object that may be absent; absent is a no-op
    pub fn register_opt<T: Trackable>(&self, object: Option<&Arc<T>>) -> bool {
        object.map_or(false, |o| self.register(o))
    }

    /// Live instance count per type, omitting types with no live instances
    pub fn live_counts(&self) -> BTreeMap<TypeKey, u64> {
        let mut counts = BTreeMap::new();
        let mut pruned = 0;

        for (key, bucket) in self.bucket_list() {
            let mut guard = bucket.lock();
            pruned += guard.prune();
            let live = guard.handles.len() as u64;
            drop(guard);

            if live > 0 {
                counts.insert(key, live);
            } else {
                self.retire_if_empty(&key, &bucket);
            }
        }

        self.record_pruned(pruned);
        counts
    }

    /// Live instance count for one type
    pub fn live_count(&self, key: &TypeKey) -> u64 {
        let bucket = match self.buckets.get(key) {
            Some(entry) => Arc::clone(entry.value()),
            None => return 0,
        };

        let mut guard = bucket.lock();
        let pruned = guard.prune();
        let live = guard.handles.len() as u64;
        drop(guard);

        if live == 0 {
            self.retire_if_empty(key, &bucket);
        }
        self.record_pruned(pruned);
        live
    }

    /// Strong handles to every live object, grouped by type
    ///
    /// The returned `Arc`s keep their objects alive until dropped; callers
    /// should release them as soon as the detail has been extracted.
    pub fn live_objects_by_type(&self) -> BTreeMap<TypeKey, Vec<Arc<dyn Trackable>>> {
        let mut objects = BTreeMap::new();
        let mut pruned = 0;

        for (key, bucket) in self.bucket_list() {
            let mut guard = bucket.lock();
            pruned += guard.prune();
            let live: Vec<Arc<dyn Trackable>> =
                guard.handles.iter().filter_map(WeakHandle::upgrade).collect();
            drop(guard);

            if !live.is_empty() {
                objects.insert(key, live);
            } else {
                self.retire_if_empty(&key, &bucket);
            }
        }

        self.record_pruned(pruned);
        objects
    }

    /// Forget everything
    ///
    /// Registrations racing with this call may be lost.
    pub fn clear(&self) {
        let buckets = self.buckets.len();
        self.buckets.clear();
        info!(buckets, "Weak registry cleared");
    }

    /// Number of type buckets, including ones whose objects died since the
    /// last read
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            registered: self.registered.load(Ordering::Relaxed),
            duplicates_ignored: self.duplicates.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
            buckets_retired: self.retired.load(Ordering::Relaxed),
            buckets: self.buckets.len(),
        }
    }

    fn bucket(&self, key: &TypeKey) -> SharedBucket {
        if let Some(existing) = self.buckets.get(key) {
            return Arc::clone(existing.value());
        }

        let entry = self
            .buckets
            .entry(key.clone())
            .or_insert_with(|| {
                debug!(type_key = %key, "New type bucket");
                Arc::new(Mutex::new(Bucket::new()))
            });
        Arc::clone(entry.value())
    }

    /// Drop `key` from the table if it still maps to `bucket` and that
    /// bucket is still empty
    ///
    /// Lock order is shard, then bucket. No path takes a shard lock while
    /// holding a bucket lock.
    fn retire_if_empty(&self, key: &TypeKey, bucket: &SharedBucket) {
        let removed = self.buckets.remove_if(key, |_, current| {
            if !Arc::ptr_eq(current, bucket) {
                return false;
            }
            let mut guard = current.lock();
            if !guard.handles.is_empty() {
                return false;
            }
            guard.retired = true;
            true
        });

        if removed.is_some() {
            self.retired.fetch_add(1, Ordering::Relaxed);
            trace!(type_key = %key, "Retired empty bucket");
        }
    }

    /// Copy out bucket references so no shard lock is held while pruning
    fn bucket_list(&self) -> Vec<(TypeKey, SharedBucket)> {
        self.buckets
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }

    fn record_pruned(&self, pruned: usize) {
        if pruned > 0 {
            self.pruned.fetch_add(pruned as u64, Ordering::Relaxed);
            trace!(pruned, "Pruned dead handles");
        }
    }
}

impl Default for WeakRegistry {
    fn default() -> Self {
        Self::new()
    }
}
