/*!
 * Analysis Module
 *
 * Pure functions over snapshots: deltas, rankings, averages and time
 * series. Nothing here touches the live registry.
 */

pub mod diff;
pub mod export;
pub mod series;
pub mod spike;
pub mod summary;

// Re-export for convenience
pub use diff::{diff, diff_ordered, heatmap, render_diff, DiffOrder, TypeDelta};
pub use export::{count_rows, delta_rows, memory_report, to_csv, MemoryReportEntry, TabularRow};
pub use series::{GraphSeries, SeriesPoint};
pub use spike::{
    detect_spikes, IgnoreList, Spike, SpikeClassifier, SpikeRules, SpikeTrigger, TrendStatus,
};
pub use summary::{summary, Summary, SummaryEntry};
