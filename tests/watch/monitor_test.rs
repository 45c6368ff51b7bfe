/*!
 * Alert Loop Tests
 */

use object_census::analysis::SpikeTrigger;
use object_census::sizing::NoLayouts;
use object_census::{CensusConfig, CensusContext, MemoryProvider, Result, Trackable};
use std::sync::Arc;
use std::time::Duration;

struct Arrow;
impl Trackable for Arrow {}

struct Zombie;
impl Trackable for Zombie {}

fn provider() -> MemoryProvider {
    Arc::new(|| -> Result<u64> { Ok(0) })
}

#[tokio::test]
async fn test_ignored_types_do_not_alert() {
    let config = CensusConfig {
        spike_instance_threshold: 10,
        ignore_fragments: vec!["ARROW".into()],
        check_interval: Duration::from_secs(3600),
        ..CensusConfig::default()
    };
    let ctx = CensusContext::new(config, Arc::new(NoLayouts)).unwrap();
    let monitor = ctx.spawn_monitor(provider()).unwrap();
    let mut alerts = monitor.subscribe();

    monitor.check_now().await.unwrap();
    let arrows: Vec<_> = (0..50).map(|_| Arc::new(Arrow)).collect();
    let zombies: Vec<_> = (0..20).map(|_| Arc::new(Zombie)).collect();
    arrows.iter().for_each(|a| {
        ctx.register(a);
    });
    zombies.iter().for_each(|z| {
        ctx.register(z);
    });
    monitor.check_now().await.unwrap();

    let alert = alerts.try_recv().unwrap();
    assert_eq!(alert.spike.delta.key.as_str(), "Zombie");
    assert_eq!(alert.spike.trigger, SpikeTrigger::Instances);
    assert!(alerts.try_recv().is_err());

    // The diff itself still has the ignored type
    let changes = ctx
        .latest_diff(object_census::DiffOrder::Magnitude)
        .unwrap();
    assert_eq!(changes[0].key.as_str(), "Arrow");

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_periodic_checks_fill_history() {
    let config = CensusConfig {
        check_interval: Duration::from_secs(60),
        ..CensusConfig::default()
    };
    let ctx = CensusContext::new(config, Arc::new(NoLayouts)).unwrap();
    let monitor = ctx.spawn_monitor(provider()).unwrap();

    for _ in 0..3 {
        tokio::time::sleep(Duration::from_secs(60)).await;
        // Captures run on the blocking pool; wait for each to land
        loop {
            let stats = monitor.stats();
            if stats.completed + stats.failed == stats.started {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    let stats = monitor.stats();
    monitor.shutdown().await;

    assert_eq!(stats.failed, 0);
    assert!(stats.started >= 1);
    assert_eq!(ctx.history().len() as u64, stats.completed);
}
