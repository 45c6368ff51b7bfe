/*!
 * Capture Loop
 *
 * Background task that captures a snapshot on a fixed interval and hands it
 * to a [`SnapshotSink`]. Captures run on the blocking pool because the host
 * memory provider may force a full collection.
 *
 * - A tick that finds the previous capture still running is skipped
 * - Shutdown is observed before the next tick; a capture already running
 *   is allowed to finish
 */

use super::capture::{MemoryProvider, SnapshotCapture};
use super::cycle::{CycleGuard, CyclePermit};
use super::history::SnapshotSink;
use super::types::Snapshot;
use crate::core::{CensusError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Control messages for the capture task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopCommand {
    /// Start a cycle now (still subject to the overlap guard)
    Trigger,
    Shutdown,
}

/// Cycle counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoopStats {
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
    pub skipped: u64,
}

#[derive(Debug, Default)]
struct LoopCounters {
    started: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

/// Everything a cycle needs, shared between the loop and on-demand captures
#[derive(Clone)]
struct CycleContext {
    capture: SnapshotCapture,
    provider: MemoryProvider,
    sink: Arc<dyn SnapshotSink>,
    guard: CycleGuard,
    counters: Arc<LoopCounters>,
    individual_tracking: bool,
}

impl CycleContext {
    /// Start a background cycle unless one is running
    fn start_cycle(&self, reason: &'static str) {
        let Some(permit) = self.guard.try_enter() else {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            debug!(reason, "Capture still running, skipping cycle");
            return;
        };

        self.counters.started.fetch_add(1, Ordering::Relaxed);
        let ctx = self.clone();
        tokio::task::spawn_blocking(move || {
            let _ = ctx.run_cycle(permit);
        });
    }

    /// Runs while holding `permit`, released once the sink has the snapshot
    fn run_cycle(&self, permit: CyclePermit) -> Result<Arc<Snapshot>> {
        let _permit = permit;
        let provider = Arc::clone(&self.provider);
        let outcome = self
            .capture
            .capture(self.individual_tracking, move || provider());

        match outcome {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.sink.store(Arc::clone(&snapshot));
                self.counters.completed.fetch_add(1, Ordering::Relaxed);
                Ok(snapshot)
            }
            Err(err) => {
                // Already logged by the capture itself
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }
}

/// Handle to the periodic capture task
pub struct CaptureLoop {
    command_tx: mpsc::UnboundedSender<LoopCommand>,
    handle: Option<tokio::task::JoinHandle<()>>,
    ctx: CycleContext,
}

impl CaptureLoop {
    /// Spawn the loop on the current tokio runtime
    ///
    /// The first capture happens one `interval` after spawning.
    pub fn spawn(
        capture: SnapshotCapture,
        provider: MemoryProvider,
        sink: Arc<dyn SnapshotSink>,
        interval: Duration,
        individual_tracking: bool,
    ) -> Result<Self> {
        Self::spawn_guarded(
            capture,
            provider,
            sink,
            interval,
            individual_tracking,
            CycleGuard::new(),
        )
    }

    /// Like [`CaptureLoop::spawn`], but cycles share `guard` with other
    /// capture paths, so none of them overlap
    pub fn spawn_guarded(
        capture: SnapshotCapture,
        provider: MemoryProvider,
        sink: Arc<dyn SnapshotSink>,
        interval: Duration,
        individual_tracking: bool,
        guard: CycleGuard,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(CensusError::Configuration(
                "capture interval must be non-zero".into(),
            ));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| CensusError::NoRuntime)?;

        let ctx = CycleContext {
            capture,
            provider,
            sink,
            guard,
            counters: Arc::new(LoopCounters::default()),
            individual_tracking,
        };

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let loop_ctx = ctx.clone();
        let handle = runtime.spawn(async move {
            run_capture_loop(loop_ctx, interval, command_rx).await;
        });

        info!(interval_secs = interval.as_secs_f64(), "Capture loop spawned");

        Ok(Self {
            command_tx,
            handle: Some(handle),
            ctx,
        })
    }

    /// Start a cycle now without waiting for it
    pub fn trigger(&self) {
        let _ = self.command_tx.send(LoopCommand::Trigger);
    }

    /// Capture immediately and wait for the result
    ///
    /// Shares the loop's overlap guard: fails with
    /// [`CensusError::CaptureInProgress`] while another cycle is running.
    pub async fn capture_now(&self) -> Result<Arc<Snapshot>> {
        let Some(permit) = self.ctx.guard.try_enter() else {
            self.ctx.counters.skipped.fetch_add(1, Ordering::Relaxed);
            return Err(CensusError::CaptureInProgress);
        };

        self.ctx.counters.started.fetch_add(1, Ordering::Relaxed);
        let ctx = self.ctx.clone();
        tokio::task::spawn_blocking(move || ctx.run_cycle(permit))
            .await
            .map_err(|e| CensusError::CaptureFailed(e.to_string()))?
    }

    pub fn guard(&self) -> &CycleGuard {
        &self.ctx.guard
    }

    pub fn stats(&self) -> LoopStats {
        let c = &self.ctx.counters;
        LoopStats {
            started: c.started.load(Ordering::Relaxed),
            completed: c.completed.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            skipped: c.skipped.load(Ordering::Relaxed),
        }
    }

    /// Stop the loop; no cycle starts after this returns
    pub async fn shutdown(mut self) {
        let _ = self.command_tx.send(LoopCommand::Shutdown);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Capture loop shutdown error");
            } else {
                info!("Capture loop shutdown complete");
            }
        }
    }
}

async fn run_capture_loop(
    ctx: CycleContext,
    interval: Duration,
    mut command_rx: mpsc::UnboundedReceiver<LoopCommand>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // Commands first so a pending shutdown beats a due tick
            biased;

            cmd = command_rx.recv() => match cmd {
                Some(LoopCommand::Trigger) => ctx.start_cycle("trigger"),
                Some(LoopCommand::Shutdown) | None => {
                    debug!("Capture loop stopping");
                    break;
                }
            },

            _ = ticker.tick() => ctx.start_cycle("interval"),
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.command_tx.send(LoopCommand::Shutdown);
        }
    }
}
