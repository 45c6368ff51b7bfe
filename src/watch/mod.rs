/*!
 * Watch Module
 * Per-type polling watches with trend classification
 */

pub mod scheduler;
pub mod types;

pub use scheduler::WatchScheduler;
pub use types::{WatchEvent, WatchHandle, WatchState, WatchedType};
