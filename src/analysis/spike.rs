/*!
 * Spike Classification
 *
 * Trend classification for watches and threshold-based spike detection for
 * the alert loop. The ignore list only filters what gets alerted on.
 */

use super::diff::{diff, sort_by_magnitude, TypeDelta};
use crate::core::limits::{DEFAULT_GROW_THRESHOLD, DEFAULT_LEAK_THRESHOLD, DEFAULT_SHRINK_THRESHOLD};
use crate::core::types::TypeKey;
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a type's population between two readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStatus {
    Leaking,
    Growing,
    Shrinking,
    Stable,
}

impl fmt::Display for TrendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendStatus::Leaking => "leaking",
            TrendStatus::Growing => "growing",
            TrendStatus::Shrinking => "shrinking",
            TrendStatus::Stable => "stable",
        };
        f.write_str(label)
    }
}

/// Delta thresholds: `leak` and `grow` are inclusive lower bounds, `shrink`
/// an inclusive upper bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SpikeClassifier {
    pub leak: i64,
    pub grow: i64,
    pub shrink: i64,
}

impl SpikeClassifier {
    pub fn new(leak: i64, grow: i64, shrink: i64) -> Self {
        Self { leak, grow, shrink }
    }

    pub fn classify(&self, delta: i64) -> TrendStatus {
        if delta >= self.leak {
            TrendStatus::Leaking
        } else if delta >= self.grow {
            TrendStatus::Growing
        } else if delta <= self.shrink {
            TrendStatus::Shrinking
        } else {
            TrendStatus::Stable
        }
    }
}

impl Default for SpikeClassifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_LEAK_THRESHOLD,
            DEFAULT_GROW_THRESHOLD,
            DEFAULT_SHRINK_THRESHOLD,
        )
    }
}

/// Case-insensitive substring filter over type keys
///
/// Blank fragments are dropped; they would otherwise match every key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    fragments: Vec<String>,
}

impl IgnoreList {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fragments = fragments
            .into_iter()
            .map(|f| f.as_ref().trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        Self { fragments }
    }

    pub fn is_ignored(&self, key: &TypeKey) -> bool {
        if self.fragments.is_empty() {
            return false;
        }
        let key = key.as_str().to_lowercase();
        self.fragments.iter().any(|f| key.contains(f.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

/// Growth limits between consecutive captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SpikeRules {
    pub instance_threshold: u64,
    pub memory_threshold_bytes: u64,
}

/// Which limit a spike crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpikeTrigger {
    Instances,
    Memory,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Spike {
    pub delta: TypeDelta,
    pub trigger: SpikeTrigger,
}

/// Types that grew past either limit from `a` to `b`, largest first
pub fn detect_spikes(a: &Snapshot, b: &Snapshot, rules: &SpikeRules, ignore: &IgnoreList) -> Vec<Spike> {
    let mut entries: Vec<TypeDelta> = diff(a, b)
        .into_iter()
        .filter(|d| !ignore.is_ignored(&d.key))
        .collect();
    sort_by_magnitude(&mut entries);

    entries
        .into_iter()
        .filter_map(|delta| {
            let by_count = delta.delta > 0 && delta.delta as u64 >= rules.instance_threshold;
            let by_memory =
                delta.bytes_delta > 0 && delta.bytes_delta as u64 >= rules.memory_threshold_bytes;
            let trigger = match (by_count, by_memory) {
                (true, true) => SpikeTrigger::Both,
                (true, false) => SpikeTrigger::Instances,
                (false, true) => SpikeTrigger::Memory,
                (false, false) => return None,
            };
            Some(Spike { delta, trigger })
        })
        .collect()
}
