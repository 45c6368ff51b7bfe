/*!
 * Population Summary
 *
 * Average per-type population across a sequence of snapshots.
 */

use crate::core::types::TypeKey;
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SummaryEntry {
    pub key: TypeKey,
    /// Count sum over snapshot count, truncated
    pub average: u64,
    /// Estimated bytes summed across every snapshot
    pub estimated_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Summary {
    pub entries: Vec<SummaryEntry>,
    pub snapshot_count: usize,
    /// Sum of `estimated_bytes` over the returned entries
    pub estimated_memory_bytes: u64,
}

/// The `top_n` types by average count, largest first
pub fn summary<S: Borrow<Snapshot>>(snapshots: &[S], top_n: usize) -> Summary {
    if snapshots.is_empty() {
        return Summary::default();
    }

    let mut totals: BTreeMap<&TypeKey, (u64, u64)> = BTreeMap::new();
    for snapshot in snapshots.iter().map(Borrow::borrow) {
        for (key, count) in snapshot.counts() {
            let slot = totals.entry(key).or_default();
            slot.0 = slot.0.saturating_add(*count);
        }
        for (key, bytes) in snapshot.estimated_memory_bytes_per_type() {
            let slot = totals.entry(key).or_default();
            slot.1 = slot.1.saturating_add(*bytes);
        }
    }

    let divisor = snapshots.len() as u64;
    let mut entries: Vec<SummaryEntry> = totals
        .into_iter()
        .map(|(key, (count, bytes))| SummaryEntry {
            key: key.clone(),
            average: count / divisor,
            estimated_bytes: bytes,
        })
        .collect();

    // Stable sort keeps alphabetical order among equal averages
    entries.sort_by(|a, b| b.average.cmp(&a.average));
    entries.truncate(top_n);

    let estimated_memory_bytes = entries.iter().map(|e| e.estimated_bytes).sum();

    Summary {
        entries,
        snapshot_count: snapshots.len(),
        estimated_memory_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::{Duration, UNIX_EPOCH};

    fn snap(secs: u64, counts: &[(&str, u64)]) -> Snapshot {
        Snapshot::from_counts(
            UNIX_EPOCH + Duration::from_secs(secs),
            counts.iter().map(|(k, v)| (*k, *v)),
        )
    }

    fn sized(counts: &[(&str, u64, u64)]) -> Snapshot {
        let c = counts.iter().map(|(k, n, _)| (TypeKey::new(*k), *n)).collect();
        let s = counts.iter().map(|(k, _, b)| (TypeKey::new(*k), *b)).collect();
        Snapshot::new(UNIX_EPOCH, 0, c, s, None)
    }

    #[test]
    fn test_average_truncates() {
        let snapshots = [snap(1, &[("Foo", 1)]), snap(2, &[("Foo", 2)])];
        let result = summary(&snapshots, 10);

        assert_eq!(result.snapshot_count, 2);
        assert_eq!(result.entries[0].average, 1);
    }

    #[test]
    fn test_missing_type_counts_as_zero() {
        let snapshots = [
            snap(1, &[("Foo", 9), ("Bar", 4)]),
            snap(2, &[("Foo", 9)]),
            snap(3, &[("Foo", 9)]),
        ];
        let result = summary(&snapshots, 10);

        let averages: Vec<(&str, u64)> = result
            .entries
            .iter()
            .map(|e| (e.key.as_str(), e.average))
            .collect();
        assert_eq!(averages, vec![("Foo", 9), ("Bar", 1)]);
    }

    #[test]
    fn test_top_n_and_memory() {
        let snapshots = vec![
            Arc::new(sized(&[("A", 10, 8), ("B", 5, 8), ("C", 1, 100)])),
            Arc::new(sized(&[("A", 10, 8), ("B", 5, 8), ("C", 1, 100)])),
        ];
        let result = summary(&snapshots, 2);

        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].key.as_str(), "A");
        assert_eq!(result.entries[0].estimated_bytes, 160);
        assert_eq!(result.entries[1].estimated_bytes, 80);
        assert_eq!(result.estimated_memory_bytes, 240);
    }

    #[test]
    fn test_empty_input() {
        let result = summary::<Snapshot>(&[], 5);
        assert!(result.entries.is_empty());
        assert_eq!(result.snapshot_count, 0);
    }
}
