/*!
 * Registry Tests
 * Weak tracking under concurrent producers
 */

use object_census::{Trackable, WeakRegistry};
use pretty_assertions::assert_eq;
use std::borrow::Cow;
use std::sync::Arc;
use std::thread;

struct Foo;
impl Trackable for Foo {}

struct Bar;
impl Trackable for Bar {}

struct Mob {
    kind: &'static str,
    elite: bool,
}

impl Trackable for Mob {
    fn type_name(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.kind)
    }

    fn variant(&self) -> Option<Cow<'_, str>> {
        self.elite.then_some(Cow::Borrowed("elite"))
    }
}

#[test]
fn test_double_registration_counts_once() {
    let registry = WeakRegistry::new();
    let foo = Arc::new(Foo);

    assert!(registry.register(&foo));
    assert!(!registry.register(&foo));
    assert!(!registry.register(&Arc::clone(&foo)));

    assert_eq!(registry.live_count(&"Foo".into()), 1);
    assert_eq!(registry.stats().duplicates_ignored, 2);
}

#[test]
fn test_registry_does_not_keep_objects_alive() {
    let registry = WeakRegistry::new();
    let foo = Arc::new(Foo);
    let weak = Arc::downgrade(&foo);
    registry.register(&foo);

    drop(foo);
    assert!(weak.upgrade().is_none());
    assert!(registry.live_counts().is_empty());
}

#[test]
fn test_bucket_shrinks_monotonically() {
    let registry = WeakRegistry::new();
    let mut foos: Vec<_> = (0..10).map(|_| Arc::new(Foo)).collect();
    foos.iter().for_each(|f| {
        registry.register(f);
    });

    let mut previous = registry.live_count(&"Foo".into());
    assert_eq!(previous, 10);
    while foos.pop().is_some() {
        let now = registry.live_count(&"Foo".into());
        assert!(now < previous);
        previous = now;
    }
    assert_eq!(previous, 0);
    assert_eq!(registry.stats().pruned, 10);
}

#[test]
fn test_variants_counted_separately() {
    let registry = WeakRegistry::new();
    let plain = Arc::new(Mob {
        kind: "Zombie",
        elite: false,
    });
    let elite = Arc::new(Mob {
        kind: "Zombie",
        elite: true,
    });
    registry.register(&plain);
    registry.register(&elite);

    let counts = registry.live_counts();
    assert_eq!(counts.get("Zombie"), Some(&1));
    assert_eq!(counts.get("Zombie#elite"), Some(&1));
}

#[test]
fn test_concurrent_producers() {
    let registry = Arc::new(WeakRegistry::new());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut kept = Vec::new();
                for i in 0..500 {
                    if (t + i) % 2 == 0 {
                        let foo = Arc::new(Foo);
                        registry.register(&foo);
                        kept.push(foo);
                    } else {
                        let bar = Arc::new(Bar);
                        registry.register(&bar);
                        // Dropped immediately
                    }
                }
                kept
            })
        })
        .collect();

    let kept: Vec<Arc<Foo>> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    let counts = registry.live_counts();
    assert_eq!(counts.get("Foo").copied(), Some(kept.len() as u64));
    assert_eq!(counts.get("Bar"), None);
    assert_eq!(registry.stats().registered, 4_000);
}

#[test]
fn test_reads_during_registration() {
    let registry = Arc::new(WeakRegistry::new());
    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            let foos: Vec<_> = (0..2_000).map(|_| Arc::new(Foo)).collect();
            foos.iter().for_each(|f| {
                registry.register(f);
            });
            foos
        })
    };

    let mut last = 0;
    for _ in 0..100 {
        let now = registry.live_count(&"Foo".into());
        assert!(now >= last);
        last = now;
    }

    let foos = writer.join().unwrap();
    assert_eq!(registry.live_count(&"Foo".into()), foos.len() as u64);
}

#[test]
fn test_absent_object_is_noop() {
    let registry = WeakRegistry::new();
    assert!(!registry.register_opt::<Foo>(None));
    assert_eq!(registry.bucket_count(), 0);
}
