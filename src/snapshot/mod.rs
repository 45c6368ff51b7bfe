/*!
 * Snapshot Module
 * Point-in-time population records, capture and periodic collection
 */

pub mod capture;
pub mod capture_loop;
pub mod cycle;
pub mod history;
pub mod types;

// Re-export for convenience
pub use capture::{MemoryProvider, SnapshotCapture};
pub use capture_loop::{CaptureLoop, LoopStats};
pub use cycle::{CycleGuard, CyclePermit};
pub use history::{SnapshotHistory, SnapshotSink};
pub use types::{InstanceInfo, Snapshot};
