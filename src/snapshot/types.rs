/*!
 * Snapshot Types
 *
 * Immutable point-in-time population record and its JSON interchange form.
 *
 * Interchange fields (camelCase): `timestamp` (epoch millis),
 * `totalManagedMemoryBytes`, `objectCountsByType`, `estimatedBytesPerType`
 * (optional), `estimatedMemoryBytesPerType`, `trackedInstancesByType`
 * (optional).
 */

use crate::core::serde::{is_empty_map, serde_as, TimestampMilliSeconds};
use crate::core::types::{Position, TypeKey};
use crate::core::{CensusError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Per-instance debugging detail
///
/// Heuristic and lossy: `id` is meant for a human, not as a stable key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub id: String,
    pub position: Option<Position>,
}

/// Immutable population record
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    timestamp: SystemTime,
    total_managed_memory_bytes: u64,
    object_counts_by_type: BTreeMap<TypeKey, u64>,
    #[serde(default, skip_serializing_if = "is_empty_map")]
    estimated_bytes_per_type: BTreeMap<TypeKey, u64>,
    estimated_memory_bytes_per_type: BTreeMap<TypeKey, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tracked_instances_by_type: Option<BTreeMap<TypeKey, Vec<InstanceInfo>>>,
}

impl Snapshot {
    /// Assemble a snapshot, deriving estimated totals as count x per-instance size
    ///
    /// The timestamp is truncated to whole milliseconds, the resolution of
    /// the interchange format.
    pub fn new(
        timestamp: SystemTime,
        total_managed_memory_bytes: u64,
        object_counts_by_type: BTreeMap<TypeKey, u64>,
        estimated_bytes_per_type: BTreeMap<TypeKey, u64>,
        tracked_instances_by_type: Option<BTreeMap<TypeKey, Vec<InstanceInfo>>>,
    ) -> Self {
        let estimated_memory_bytes_per_type = object_counts_by_type
            .iter()
            .filter_map(|(key, count)| {
                estimated_bytes_per_type
                    .get(key)
                    .map(|size| (key.clone(), size.saturating_mul(*count)))
            })
            .collect();

        Self {
            timestamp: truncate_to_millis(timestamp),
            total_managed_memory_bytes,
            object_counts_by_type,
            estimated_bytes_per_type,
            estimated_memory_bytes_per_type,
            tracked_instances_by_type,
        }
    }

    /// Counts-only snapshot with no size information
    pub fn from_counts<I, K>(timestamp: SystemTime, counts: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: Into<TypeKey>,
    {
        let counts = counts.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::new(timestamp, 0, counts, BTreeMap::new(), None)
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Milliseconds since the UNIX epoch
    pub fn timestamp_millis(&self) -> i64 {
        match self.timestamp.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_millis() as i64,
            Err(e) => -(e.duration().as_millis() as i64),
        }
    }

    pub fn total_managed_memory_bytes(&self) -> u64 {
        self.total_managed_memory_bytes
    }

    pub fn counts(&self) -> &BTreeMap<TypeKey, u64> {
        &self.object_counts_by_type
    }

    /// Live count for one type, zero if absent
    pub fn count(&self, key: &str) -> u64 {
        self.object_counts_by_type.get(key).copied().unwrap_or(0)
    }

    pub fn total_instances(&self) -> u64 {
        self.object_counts_by_type.values().sum()
    }

    pub fn estimated_bytes_per_type(&self) -> &BTreeMap<TypeKey, u64> {
        &self.estimated_bytes_per_type
    }

    pub fn estimated_memory_bytes_per_type(&self) -> &BTreeMap<TypeKey, u64> {
        &self.estimated_memory_bytes_per_type
    }

    /// Estimated total bytes for one type, zero if absent
    pub fn estimated_memory(&self, key: &str) -> u64 {
        self.estimated_memory_bytes_per_type
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_estimated_memory(&self) -> u64 {
        self.estimated_memory_bytes_per_type.values().sum()
    }

    pub fn tracked_instances(&self) -> Option<&BTreeMap<TypeKey, Vec<InstanceInfo>>> {
        self.tracked_instances_by_type.as_ref()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode an interchange record
    ///
    /// A record whose count or estimated-memory map is missing or null is
    /// reported as [`CensusError::SnapshotUnusable`].
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CensusError::SnapshotUnusable(e.to_string()))
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| CensusError::SnapshotUnusable(e.to_string()))
    }
}

fn truncate_to_millis(time: SystemTime) -> SystemTime {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => UNIX_EPOCH + Duration::from_millis(d.as_millis() as u64),
        Err(_) => time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Snapshot {
        let counts = BTreeMap::from([(TypeKey::new("Foo"), 3), (TypeKey::new("Bar"), 1)]);
        let sizes = BTreeMap::from([(TypeKey::new("Foo"), 24), (TypeKey::new("Bar"), 64)]);
        let instances = BTreeMap::from([(
            TypeKey::new("Bar"),
            vec![InstanceInfo {
                id: "7 (bar)".into(),
                position: Some(Position::new(1, 64, -3)),
            }],
        )]);
        Snapshot::new(
            UNIX_EPOCH + Duration::from_millis(1_700_000_000_123),
            4096,
            counts,
            sizes,
            Some(instances),
        )
    }

    #[test]
    fn test_derived_estimates() {
        let snapshot = sample();
        assert_eq!(snapshot.estimated_memory("Foo"), 72);
        assert_eq!(snapshot.estimated_memory("Bar"), 64);
        assert_eq!(snapshot.total_estimated_memory(), 136);
        assert_eq!(snapshot.total_instances(), 4);
        assert_eq!(snapshot.count("Missing"), 0);
    }

    #[test]
    fn test_interchange_field_names() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_123i64);
        assert_eq!(json["totalManagedMemoryBytes"], 4096);
        assert_eq!(json["objectCountsByType"]["Foo"], 3);
        assert_eq!(json["estimatedBytesPerType"]["Bar"], 64);
        assert_eq!(json["estimatedMemoryBytesPerType"]["Foo"], 72);
        assert_eq!(json["trackedInstancesByType"]["Bar"][0]["position"]["y"], 64);
    }

    #[test]
    fn test_round_trip() {
        let snapshot = sample();
        let decoded = Snapshot::from_json(&snapshot.to_json_pretty().unwrap()).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_optional_maps_may_be_absent() {
        let json = r#"{
            "timestamp": 1000,
            "totalManagedMemoryBytes": 0,
            "objectCountsByType": {"Foo": 2},
            "estimatedMemoryBytesPerType": {}
        }"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        assert_eq!(snapshot.count("Foo"), 2);
        assert!(snapshot.tracked_instances().is_none());
        assert!(snapshot.estimated_bytes_per_type().is_empty());
    }

    #[test]
    fn test_missing_or_null_required_map_is_unusable() {
        let missing = r#"{"timestamp": 1, "totalManagedMemoryBytes": 0, "estimatedMemoryBytesPerType": {}}"#;
        assert!(matches!(
            Snapshot::from_json(missing),
            Err(CensusError::SnapshotUnusable(_))
        ));

        let null = r#"{"timestamp": 1, "totalManagedMemoryBytes": 0,
                       "objectCountsByType": null, "estimatedMemoryBytesPerType": {}}"#;
        assert!(matches!(
            Snapshot::from_json(null),
            Err(CensusError::SnapshotUnusable(_))
        ));

        assert!(matches!(
            Snapshot::from_json_slice(b"not json"),
            Err(CensusError::SnapshotUnusable(_))
        ));
    }

    #[test]
    fn test_timestamp_truncated_to_millis() {
        let t = UNIX_EPOCH + Duration::from_nanos(1_500_000_999);
        let snapshot = Snapshot::from_counts(t, [("Foo", 1)]);
        assert_eq!(snapshot.timestamp_millis(), 1_500);
    }
}
