/*!
 * Census Limits and Constants
 *
 * Byte-cost table for size estimation, fallback sizes, and default
 * thresholds/intervals consumed by the analysis and scheduling layers.
 */

use std::time::Duration;

// =============================================================================
// SIZE ESTIMATION
// =============================================================================

/// Boolean and byte-sized fields
pub const BYTE_FIELD_COST: u64 = 1;

/// Short and char-sized fields
pub const SHORT_FIELD_COST: u64 = 2;

/// Int and float-sized fields
pub const INT_FIELD_COST: u64 = 4;

/// Long, double and reference-sized fields
pub const LONG_FIELD_COST: u64 = 8;

/// Widest decimal-like fields
pub const DECIMAL_FIELD_COST: u64 = 16;

/// Text fields: header plus a small inline buffer
pub const TEXT_FIELD_COST: u64 = 40;

/// Any non-primitive field is charged as a single reference
pub const REFERENCE_FIELD_COST: u64 = LONG_FIELD_COST;

/// Per-instance cost of a type whose layout cannot be resolved ("unknown type")
pub const UNKNOWN_TYPE_SIZE: u64 = 64;

// =============================================================================
// SPIKE DETECTION
// =============================================================================

/// Estimated-memory growth between two captures that counts as a spike (MB)
pub const DEFAULT_SPIKE_MEMORY_THRESHOLD_MB: u64 = 50;

/// Instance-count growth between two captures that counts as a spike
pub const DEFAULT_SPIKE_INSTANCE_THRESHOLD: u64 = 1_000;

/// Watch delta at or above which a type is reported as leaking
pub const DEFAULT_LEAK_THRESHOLD: i64 = 50;

/// Watch delta at or above which a type is reported as growing
pub const DEFAULT_GROW_THRESHOLD: i64 = 5;

/// Watch delta at or below which a type is reported as shrinking
pub const DEFAULT_SHRINK_THRESHOLD: i64 = -5;

/// Types below this estimated footprint are left out of memory reports (MB)
pub const DEFAULT_REPORT_FLOOR_MB: u64 = 1;

// =============================================================================
// SCHEDULING
// =============================================================================

/// Spike monitor check interval
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Snapshots retained by the in-memory history
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// Buffered events per broadcast subscriber before lagging
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Bytes per megabyte for threshold conversions
pub const BYTES_PER_MB: u64 = 1024 * 1024;
