/*!
 * Object Census Library
 *
 * In-process population profiler: weak-tracks live objects per type,
 * freezes the population into snapshots and compares snapshots over time
 * to surface leaks, spikes and growth trends.
 */

pub mod analysis;
pub mod config;
pub mod context;
pub mod core;
pub mod monitor;
pub mod registry;
pub mod sizing;
pub mod snapshot;
pub mod tracing_setup;
pub mod watch;

// Re-exports
pub use crate::core::{CensusError, Position, Result, TypeKey};
pub use analysis::{
    detect_spikes, diff, diff_ordered, heatmap, memory_report, render_diff, summary, DiffOrder,
    GraphSeries, IgnoreList, SpikeClassifier, SpikeRules, TrendStatus, TypeDelta,
};
pub use config::CensusConfig;
pub use context::CensusContext;
pub use monitor::{SpikeAlert, SpikeMonitor};
pub use registry::{Trackable, WeakRegistry};
pub use sizing::{DescribeLayout, FieldKind, LayoutTable, SizeEstimator, SizeOracle, TypeLayout};
pub use snapshot::{CaptureLoop, MemoryProvider, Snapshot, SnapshotCapture, SnapshotHistory, SnapshotSink};
pub use tracing_setup::init_tracing;
pub use watch::{WatchEvent, WatchHandle, WatchScheduler, WatchedType};
