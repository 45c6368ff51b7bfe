/*!
 * Shard Configuration
 *
 * CPU-topology-aware shard counts for the census's concurrent maps.
 * Registry buckets and the size cache are written from many producer
 * threads, so their shard counts scale with the host's core count.
 */

use std::sync::OnceLock;

static SHARD_MANAGER: OnceLock<ShardManager> = OnceLock::new();

/// Hardware-aware shard count calculator
#[derive(Debug, Clone)]
pub struct ShardManager {
    cpu_count: usize,
}

impl ShardManager {
    fn instance() -> &'static Self {
        SHARD_MANAGER.get_or_init(|| {
            let cpu_count = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or_else(|_| {
                    tracing::warn!("Failed to detect CPU count, defaulting to 8");
                    8
                });

            tracing::debug!(cpu_count, "ShardManager initialized");
            Self { cpu_count }
        })
    }

    /// Shard count for a given workload profile
    ///
    /// Always a power of two, clamped to `[8, 512]`.
    pub fn shards(profile: WorkloadProfile) -> usize {
        let base = Self::instance().cpu_count;

        let multiplier = match profile {
            // Bucket lookups on every registration
            WorkloadProfile::HighContention => 4,
            // Size cache: written once per type, read on every capture
            WorkloadProfile::MediumContention => 2,
            // Watch table: operator-driven
            WorkloadProfile::LowContention => 1,
        };

        (base * multiplier).next_power_of_two().clamp(8, 512)
    }

    /// CPU count detected at initialization
    pub fn cpu_count() -> usize {
        Self::instance().cpu_count
    }
}

/// Workload characterization for shard count calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadProfile {
    /// Registry bucket table (4x CPU cores)
    HighContention,
    /// Type size cache (2x CPU cores)
    MediumContention,
    /// Watch table (1x CPU cores)
    LowContention,
}
