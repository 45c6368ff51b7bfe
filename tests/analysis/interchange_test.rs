/*!
 * Interchange Tests
 * Snapshot JSON encoding and decoding
 */

use object_census::{CensusError, Snapshot, TypeKey};
use pretty_assertions::assert_eq;
use proptest::collection::btree_map;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::time::{Duration, UNIX_EPOCH};

proptest! {
    #[test]
    fn counts_survive_round_trip(
        counts in btree_map("[A-Za-z][A-Za-z0-9_]{0,8}(#[a-z]{1,4})?", any::<u64>(), 1..16),
        millis in 0u64..4_000_000_000_000,
    ) {
        let counts: BTreeMap<TypeKey, u64> =
            counts.into_iter().map(|(k, v)| (TypeKey::new(k), v)).collect();
        let snapshot = Snapshot::new(
            UNIX_EPOCH + Duration::from_millis(millis),
            0,
            counts.clone(),
            BTreeMap::new(),
            None,
        );

        let decoded = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        prop_assert_eq!(decoded.counts(), &counts);
        prop_assert_eq!(decoded.timestamp(), snapshot.timestamp());
    }
}

#[test]
fn test_reads_external_record() {
    let json = r##"{
        "timestamp": 1700000000000,
        "totalManagedMemoryBytes": 536870912,
        "objectCountsByType": {"Zombie": 40, "Zombie#elite": 2},
        "estimatedBytesPerType": {"Zombie": 24},
        "estimatedMemoryBytesPerType": {"Zombie": 960},
        "trackedInstancesByType": {
            "Zombie#elite": [
                {"id": "17 (boss)", "position": {"x": 1, "y": 64, "z": -9}},
                {"id": "#7f3a", "position": null}
            ]
        }
    }"##;

    let snapshot = Snapshot::from_json(json).unwrap();
    assert_eq!(snapshot.timestamp_millis(), 1_700_000_000_000);
    assert_eq!(snapshot.total_instances(), 42);
    assert_eq!(snapshot.estimated_memory("Zombie"), 960);

    let elites = &snapshot.tracked_instances().unwrap()["Zombie#elite"];
    assert_eq!(elites.len(), 2);
    assert_eq!(elites[0].position.map(|p| p.z), Some(-9));
    assert_eq!(elites[1].position, None);
}

#[test]
fn test_unusable_records() {
    for json in [
        r#"{"timestamp": 1, "totalManagedMemoryBytes": 0, "estimatedMemoryBytesPerType": {}}"#,
        r#"{"timestamp": 1, "totalManagedMemoryBytes": 0, "objectCountsByType": {}}"#,
        r#"{"timestamp": 1, "totalManagedMemoryBytes": 0, "objectCountsByType": {},
            "estimatedMemoryBytesPerType": null}"#,
    ] {
        let err = Snapshot::from_json(json).unwrap_err();
        assert!(matches!(err, CensusError::SnapshotUnusable(_)), "{json}");
    }
}

#[test]
fn test_error_serializes_tagged() {
    let err = CensusError::AlreadyWatching(TypeKey::new("Foo"));
    let value: serde_json::Value = serde_json::to_value(&err).unwrap();
    assert_eq!(value["error_type"], "already_watching");
    assert_eq!(value["details"], "Foo");
}
