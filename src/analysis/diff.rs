/*!
 * Snapshot Diff
 *
 * Per-type count deltas between two snapshots. Keys from both sides are
 * considered; zero deltas are dropped. Diffs are always complete: ignore
 * lists apply only to alerting.
 */

use crate::core::types::TypeKey;
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Count change of one type between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TypeDelta {
    pub key: TypeKey,
    pub old_count: u64,
    pub new_count: u64,
    /// `new_count - old_count`
    pub delta: i64,
    /// Change in estimated total bytes
    pub bytes_delta: i64,
}

/// Presentation order for diff entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffOrder {
    /// By type key
    #[default]
    Alphabetical,
    /// By `|delta|` descending, type key as tiebreak
    Magnitude,
}

/// Non-zero deltas from `a` to `b`, alphabetical
pub fn diff(a: &Snapshot, b: &Snapshot) -> Vec<TypeDelta> {
    let keys: BTreeSet<&TypeKey> = a.counts().keys().chain(b.counts().keys()).collect();

    keys.into_iter()
        .filter_map(|key| {
            let old_count = a.count(key.as_str());
            let new_count = b.count(key.as_str());
            let delta = signed_delta(old_count, new_count);
            if delta == 0 {
                return None;
            }
            Some(TypeDelta {
                key: key.clone(),
                old_count,
                new_count,
                delta,
                bytes_delta: signed_delta(
                    a.estimated_memory(key.as_str()),
                    b.estimated_memory(key.as_str()),
                ),
            })
        })
        .collect()
}

/// Non-zero deltas from `a` to `b` in the requested order
pub fn diff_ordered(a: &Snapshot, b: &Snapshot, order: DiffOrder) -> Vec<TypeDelta> {
    let mut entries = diff(a, b);
    if order == DiffOrder::Magnitude {
        sort_by_magnitude(&mut entries);
    }
    entries
}

/// The `top_n` largest-magnitude deltas from `a` to `b`
pub fn heatmap(a: &Snapshot, b: &Snapshot, top_n: usize) -> Vec<TypeDelta> {
    let mut entries = diff_ordered(a, b, DiffOrder::Magnitude);
    entries.truncate(top_n);
    entries
}

/// Human-readable lines, one per entry
///
/// Verbose lines add the before/after counts and the estimated byte change.
pub fn render_diff(entries: &[TypeDelta], verbose: bool) -> Vec<String> {
    entries
        .iter()
        .map(|e| {
            if verbose {
                format!(
                    "{}: {:+} ({} -> {}, {:+} B)",
                    e.key, e.delta, e.old_count, e.new_count, e.bytes_delta
                )
            } else {
                format!("{}: {:+}", e.key, e.delta)
            }
        })
        .collect()
}

pub(crate) fn sort_by_magnitude(entries: &mut [TypeDelta]) {
    entries.sort_by(|x, y| {
        y.delta
            .unsigned_abs()
            .cmp(&x.delta.unsigned_abs())
            .then_with(|| x.key.cmp(&y.key))
    });
}

pub(crate) fn signed_delta(old: u64, new: u64) -> i64 {
    (new as i128 - old as i128).clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
