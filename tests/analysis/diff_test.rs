/*!
 * Diff Tests
 * Properties of diff, heatmap and spike classification
 */

use object_census::{diff, heatmap, SpikeClassifier, Snapshot, TrendStatus};
use pretty_assertions::assert_eq;
use proptest::collection::btree_map;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::time::{Duration, UNIX_EPOCH};

fn snapshot(secs: u64, counts: BTreeMap<String, u64>) -> Snapshot {
    Snapshot::from_counts(UNIX_EPOCH + Duration::from_secs(secs), counts)
}

fn counts() -> impl Strategy<Value = BTreeMap<String, u64>> {
    btree_map("[A-F][a-z]{0,3}", 0u64..500, 0..12)
}

proptest! {
    #[test]
    fn self_diff_is_empty(a in counts()) {
        let a = snapshot(1, a);
        prop_assert!(diff(&a, &a).is_empty());
    }

    #[test]
    fn diff_is_antisymmetric(a in counts(), b in counts()) {
        let (a, b) = (snapshot(1, a), snapshot(2, b));
        let forward = diff(&a, &b);
        let backward = diff(&b, &a);

        prop_assert_eq!(forward.len(), backward.len());
        for (f, r) in forward.iter().zip(&backward) {
            prop_assert_eq!(&f.key, &r.key);
            prop_assert_eq!(f.delta, -r.delta);
        }
    }

    #[test]
    fn heatmap_is_ranked_subset_of_diff(a in counts(), b in counts(), top_n in 0usize..15) {
        let (a, b) = (snapshot(1, a), snapshot(2, b));
        let full = diff(&a, &b);
        let ranked = heatmap(&a, &b, top_n);

        prop_assert!(ranked.len() <= top_n);
        prop_assert_eq!(ranked.len(), full.len().min(top_n));
        for entry in &ranked {
            prop_assert!(full.contains(entry));
        }
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].delta.unsigned_abs() >= pair[1].delta.unsigned_abs());
        }
    }

    #[test]
    fn diff_never_reports_zero(a in counts(), b in counts()) {
        let (a, b) = (snapshot(1, a), snapshot(2, b));
        prop_assert!(diff(&a, &b).iter().all(|d| d.delta != 0));
    }
}

#[test]
fn test_heatmap_top_ten() {
    let a = snapshot(1, (0..20).map(|i| (format!("T{i:02}"), 100)).collect());
    let b = snapshot(2, (0..20).map(|i| (format!("T{i:02}"), 100 + i)).collect());

    let top = heatmap(&a, &b, 10);
    assert_eq!(top.len(), 10);
    assert_eq!(top[0].key.as_str(), "T19");
    assert_eq!(top[9].key.as_str(), "T10");
}

#[test]
fn test_classification_thresholds() {
    let classifier = SpikeClassifier::new(50, 5, -5);
    let cases = [
        (60, TrendStatus::Leaking),
        (10, TrendStatus::Growing),
        (-10, TrendStatus::Shrinking),
        (2, TrendStatus::Stable),
    ];
    for (delta, expected) in cases {
        assert_eq!(classifier.classify(delta), expected, "delta {delta}");
    }
}
