/*!
 * Census Demo
 *
 * Simulates a host with several producer threads spawning and despawning
 * mobs, then walks through captures, diffs, watches and spike alerts.
 */

use anyhow::Context;
use object_census::analysis::{count_rows, delta_rows, to_csv};
use object_census::core::limits::BYTES_PER_MB;
use object_census::{
    heatmap, init_tracing, memory_report, render_diff, summary, CensusConfig, CensusContext,
    DescribeLayout, FieldKind, GraphSeries, LayoutTable, MemoryProvider, Position, Trackable,
    TypeLayout,
};
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

struct Zombie {
    id: u32,
    elite: bool,
    at: Position,
}

impl Trackable for Zombie {
    fn variant(&self) -> Option<Cow<'_, str>> {
        self.elite.then_some(Cow::Borrowed("elite"))
    }

    fn instance_id(&self) -> Option<String> {
        Some(self.id.to_string())
    }

    fn position(&self) -> Option<Position> {
        Some(self.at)
    }
}

impl DescribeLayout for Zombie {
    fn layout() -> TypeLayout {
        TypeLayout::new([FieldKind::Int, FieldKind::Bool, FieldKind::Reference])
    }
}

struct Arrow;
impl Trackable for Arrow {}

/// Stand-in for the host's heap statistics
fn heap_provider(heap_mb: Arc<AtomicU64>) -> MemoryProvider {
    Arc::new(move || -> object_census::Result<u64> {
        Ok(heap_mb.load(Ordering::Relaxed) * BYTES_PER_MB)
    })
}

fn spawn_wave(ctx: &CensusContext, producers: u32, per_producer: u32) -> Vec<Arc<Zombie>> {
    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let ctx = ctx.clone();
            thread::spawn(move || {
                (0..per_producer)
                    .map(|i| {
                        let zombie = Arc::new(Zombie {
                            id: p * 1_000 + i,
                            elite: i % 10 == 0,
                            at: Position::new(i as i32, 64, p as i32),
                        });
                        ctx.register(&zombie);
                        zombie
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    handles
        .into_iter()
        .filter_map(|h| h.join().ok())
        .flatten()
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut config = CensusConfig::from_env().context("invalid CENSUS_* configuration")?;
    config.check_interval = Duration::from_secs(1);
    config.spike_instance_threshold = config.spike_instance_threshold.min(100);
    if config.ignore_fragments.is_empty() {
        config.ignore_fragments.push("arrow".into());
    }

    let layouts = Arc::new(LayoutTable::new());
    layouts.describe::<Zombie>();
    let ctx = CensusContext::new(config.clone(), layouts).context("building census context")?;

    let heap_mb = Arc::new(AtomicU64::new(128));
    let provider = heap_provider(Arc::clone(&heap_mb));

    let baseline = ctx.snapshot(|| provider()).context("baseline capture")?;
    info!(types = baseline.counts().len(), "Baseline captured");

    let watch = ctx.start_watch("Zombie", Duration::from_millis(500))?;
    let mut watch_events = ctx.watches().subscribe();
    info!(watch_id = %watch.id, "Watching zombies");

    let first_wave = spawn_wave(&ctx, 4, 50);
    let arrows: Vec<_> = (0..500).map(|_| Arc::new(Arrow)).collect();
    arrows.iter().for_each(|a| {
        ctx.register(a);
    });
    heap_mb.fetch_add(64, Ordering::Relaxed);

    let after_wave = ctx.snapshot(|| provider())?;
    for line in render_diff(&heatmap(&baseline, &after_wave, 5), config.verbose_diff) {
        println!("{line}");
    }

    if let Ok(event) = tokio::time::timeout(Duration::from_secs(2), watch_events.recv()).await {
        let event = event?;
        info!(count = event.count, delta = event.delta, status = %event.status, "Watch event");
    }

    let monitor = ctx.spawn_monitor(Arc::clone(&provider))?;
    let mut alerts = monitor.subscribe();
    monitor.check_now().await?;
    let second_wave = spawn_wave(&ctx, 8, 40);
    drop(arrows);
    monitor.check_now().await?;

    while let Ok(alert) = alerts.try_recv() {
        println!(
            "spike: {} {:+} ({:?})",
            alert.spike.delta.key, alert.spike.delta.delta, alert.spike.trigger
        );
    }
    monitor.shutdown().await;

    drop(first_wave);
    let settled = ctx.snapshot(|| provider())?;

    let history = ctx.history().to_vec();
    let overview = summary(&history, 5);
    println!("\naverage population over {} snapshots:", overview.snapshot_count);
    for entry in &overview.entries {
        println!("  {:<16} {:>6} (~{} B)", entry.key, entry.average, entry.estimated_bytes);
    }

    println!("\nzombie series:");
    for point in GraphSeries::new(&history, "zombie", 10) {
        println!("  {:?} {}", point.timestamp, point.count);
    }

    println!("\nmemory report (>= 0 MB):");
    for entry in memory_report(&settled, 0) {
        println!("  {:<16} {:.3} MB", entry.key, entry.megabytes());
    }

    print!("\n{}", to_csv(&count_rows(&settled), ("Type", "Count")));
    if let Some(changes) = ctx.latest_diff(object_census::DiffOrder::Magnitude) {
        print!("\n{}", to_csv(&delta_rows(&changes), ("Type", "Delta")));
    }

    drop(second_wave);
    ctx.shutdown();
    Ok(())
}
