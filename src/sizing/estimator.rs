/*!
 * Type Size Estimator
 *
 * Per-instance byte estimates derived from declared field layouts.
 * Estimates are approximations: primitive fields are charged from a fixed
 * cost table, everything else as one reference. Unknown types get
 * [`UNKNOWN_TYPE_SIZE`].
 *
 * Each key is resolved at most once per estimator; the result (including
 * the fallback) is cached for the estimator's lifetime. Two threads racing
 * on the same new key may both resolve it and write the same value.
 */

use super::traits::SizeOracle;
use crate::core::limits::UNKNOWN_TYPE_SIZE;
use crate::core::types::TypeKey;
use crate::core::{ShardManager, WorkloadProfile};
use ahash::RandomState;
use dashmap::DashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Caching per-type size estimator
pub struct SizeEstimator {
    oracle: Arc<dyn SizeOracle>,
    cache: DashMap<TypeKey, u64, RandomState>,
}

impl SizeEstimator {
    pub fn new(oracle: Arc<dyn SizeOracle>) -> Self {
        Self {
            oracle,
            cache: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                ShardManager::shards(WorkloadProfile::MediumContention),
            ),
        }
    }

    /// Estimated bytes per instance of `key`
    pub fn estimate(&self, key: &TypeKey) -> u64 {
        if let Some(cached) = self.cache.get(key) {
            return *cached;
        }

        let size = self.resolve(key);
        self.cache.insert(key.clone(), size);
        size
    }

    /// Estimated bytes for `count` instances of `key`
    pub fn estimate_total(&self, key: &TypeKey, count: u64) -> u64 {
        self.estimate(key).saturating_mul(count)
    }

    /// Cached estimate, without resolving
    pub fn cached(&self, key: &TypeKey) -> Option<u64> {
        self.cache.get(key).map(|v| *v)
    }

    pub fn cached_types(&self) -> usize {
        self.cache.len()
    }

    fn resolve(&self, key: &TypeKey) -> u64 {
        let layout = match catch_unwind(AssertUnwindSafe(|| self.oracle.layout(key))) {
            Ok(layout) => layout,
            Err(_) => {
                warn!(type_key = %key, "Layout oracle panicked, using fallback size");
                None
            }
        };

        match layout.map(|l| l.summed_size()) {
            Some(size) if size > 0 => {
                debug!(type_key = %key, size, "Estimated type size");
                size
            }
            Some(_) => {
                debug!(type_key = %key, "Layout has no sized fields, using fallback size");
                UNKNOWN_TYPE_SIZE
            }
            None => {
                debug!(type_key = %key, "Layout unresolved, using fallback size");
                UNKNOWN_TYPE_SIZE
            }
        }
    }
}

impl std::fmt::Debug for SizeEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizeEstimator")
            .field("cached_types", &self.cache.len())
            .finish()
    }
}
