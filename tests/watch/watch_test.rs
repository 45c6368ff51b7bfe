/*!
 * Watch Tests
 */

use object_census::sizing::NoLayouts;
use object_census::watch::WatchState;
use object_census::{CensusConfig, CensusContext, CensusError, Trackable, TrendStatus, TypeKey};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

struct Foo;
impl Trackable for Foo {}

fn context() -> CensusContext {
    CensusContext::new(CensusConfig::default(), Arc::new(NoLayouts)).unwrap()
}

#[tokio::test]
async fn test_start_stop_scenario() {
    let ctx = context();

    ctx.start_watch("Foo", Duration::from_secs(30)).unwrap();
    let err = ctx.start_watch("Foo", Duration::from_secs(10)).unwrap_err();
    assert_eq!(err, CensusError::AlreadyWatching(TypeKey::new("Foo")));
    assert_eq!(err.to_string(), "Already watching Foo");

    assert!(ctx.watches().stop_watch("Foo").is_ok());
    let err = ctx.watches().stop_watch("Foo").unwrap_err();
    assert_eq!(err, CensusError::NotWatched(TypeKey::new("Foo")));
}

#[tokio::test(start_paused = true)]
async fn test_leak_detected_by_watch() {
    let ctx = context();
    let mut events = ctx.watches().subscribe();
    ctx.start_watch("Foo", Duration::from_secs(30)).unwrap();

    let leaked: Vec<_> = (0..75).map(|_| Arc::new(Foo)).collect();
    leaked.iter().for_each(|f| {
        ctx.register(f);
    });

    let event = events.recv().await.unwrap();
    assert_eq!(event.key.as_str(), "Foo");
    assert_eq!(event.delta, 75);
    assert_eq!(event.status, TrendStatus::Leaking);

    let record = ctx.watches().get("Foo").unwrap();
    assert_eq!(record.last_count, 75);
    assert_eq!(record.state, WatchState::Active);
}

#[tokio::test(start_paused = true)]
async fn test_independent_intervals() {
    let ctx = context();
    let mut events = ctx.watches().subscribe();
    ctx.start_watch("Fast", Duration::from_secs(10)).unwrap();
    ctx.start_watch("Slow", Duration::from_secs(25)).unwrap();

    let mut seen = Vec::new();
    for _ in 0..4 {
        let event = events.recv().await.unwrap();
        seen.push(event.key.to_string());
    }
    // Fast at 10 and 20, Slow at 25, Fast at 30
    assert_eq!(seen, vec!["Fast", "Fast", "Slow", "Fast"]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_polls() {
    let ctx = context();
    let mut events = ctx.watches().subscribe();
    ctx.start_watch("Foo", Duration::from_secs(5)).unwrap();
    ctx.start_watch("Bar", Duration::from_secs(5)).unwrap();

    ctx.shutdown();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(events.try_recv().is_err());
    assert!(ctx.watches().watched().is_empty());
}
