/*!
 * Capture Tests
 * Snapshots taken through a census context
 */

use object_census::core::limits::UNKNOWN_TYPE_SIZE;
use object_census::sizing::NoLayouts;
use object_census::{
    diff, CensusConfig, CensusContext, CensusError, FieldKind, LayoutTable, SizeEstimator, Trackable,
    TypeKey, TypeLayout,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Foo;
impl Trackable for Foo {}

struct Bar;
impl Trackable for Bar {}

fn context() -> CensusContext {
    let layouts = LayoutTable::new();
    layouts.declare("Bar", TypeLayout::new([FieldKind::Long, FieldKind::Text]));
    CensusContext::new(CensusConfig::default(), Arc::new(layouts)).unwrap()
}

#[test]
fn test_foo_bar_scenario() {
    let ctx = context();
    let mut objects: Vec<Arc<dyn Trackable>> = Vec::new();
    for _ in 0..3 {
        let foo = Arc::new(Foo);
        ctx.register(&foo);
        objects.push(foo);
    }
    let bar = Arc::new(Bar);
    ctx.register(&bar);

    let a = ctx.snapshot(|| Ok(0)).unwrap();
    assert_eq!(a.count("Foo"), 3);
    assert_eq!(a.count("Bar"), 1);

    for _ in 0..3 {
        let foo = Arc::new(Foo);
        ctx.register(&foo);
        objects.push(foo);
    }
    let b = ctx.snapshot(|| Ok(0)).unwrap();

    let changes: Vec<(String, i64)> = diff(&a, &b)
        .into_iter()
        .map(|d| (d.key.to_string(), d.delta))
        .collect();
    assert_eq!(changes, vec![("Foo".to_string(), 3)]);
}

#[test]
fn test_sizes_attached_to_snapshot() {
    let ctx = context();
    let bar = Arc::new(Bar);
    let foo = Arc::new(Foo);
    ctx.register(&bar);
    ctx.register(&foo);

    let snapshot = ctx.snapshot(|| Ok(4096)).unwrap();
    assert_eq!(snapshot.total_managed_memory_bytes(), 4096);
    assert_eq!(snapshot.estimated_bytes_per_type().get("Bar"), Some(&48));
    assert_eq!(snapshot.estimated_memory("Foo"), UNKNOWN_TYPE_SIZE);
}

#[test]
fn test_unresolvable_type_cached_fallback() {
    let resolutions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&resolutions);
    let estimator = SizeEstimator::new(Arc::new(move |_: &TypeKey| -> Option<TypeLayout> {
        counter.fetch_add(1, Ordering::SeqCst);
        None
    }));
    let key = TypeKey::new("Ghost");

    let first = estimator.estimate_total(&key, 7);
    let second = estimator.estimate_total(&key, 7);
    assert_eq!(first, 7 * UNKNOWN_TYPE_SIZE);
    assert_eq!(first, second);
    assert_eq!(resolutions.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_capture_keeps_history() {
    let ctx = CensusContext::new(CensusConfig::default(), Arc::new(NoLayouts)).unwrap();
    ctx.snapshot(|| Ok(1)).unwrap();

    let err = ctx
        .snapshot(|| Err(CensusError::CaptureFailed("heap stats unavailable".into())))
        .unwrap_err();
    assert!(matches!(err, CensusError::CaptureFailed(_)));
    assert_eq!(ctx.history().len(), 1);
    assert_eq!(ctx.history().latest().unwrap().total_managed_memory_bytes(), 1);
}

#[test]
fn test_individual_tracking_detail() {
    let config = CensusConfig {
        individual_tracking: true,
        ..CensusConfig::default()
    };
    let ctx = CensusContext::new(config, Arc::new(NoLayouts)).unwrap();
    let foos: Vec<_> = (0..2).map(|_| Arc::new(Foo)).collect();
    foos.iter().for_each(|f| {
        ctx.register(f);
    });

    let snapshot = ctx.snapshot(|| Ok(0)).unwrap();
    let instances = snapshot.tracked_instances().unwrap();
    assert_eq!(instances["Foo"].len(), 2);
    assert!(instances["Foo"].iter().all(|i| i.id.starts_with('#')));
}
