/*!
 * Cycle Guard
 * Skip-if-running protection for periodic work
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Admits at most one cycle at a time
///
/// A tick that finds a cycle running is skipped rather than queued, so a
/// slow host cannot build up a backlog.
#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    running: Arc<AtomicBool>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or `None` if a cycle is already running
    pub fn try_enter(&self) -> Option<CyclePermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CyclePermit {
                running: Arc::clone(&self.running),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Releases its guard when dropped
#[derive(Debug)]
pub struct CyclePermit {
    running: Arc<AtomicBool>,
}

impl Drop for CyclePermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
