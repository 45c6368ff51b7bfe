/*!
 * Serde Helpers
 *
 * Skip predicates and serde_with adapters shared by the snapshot,
 * watch and config records.
 *
 * ```ignore
 * #[serde_as]
 * #[derive(Serialize, Deserialize)]
 * struct Record {
 *     #[serde_as(as = "TimestampMilliSeconds<i64>")]
 *     at: SystemTime,
 *     #[serde(default, skip_serializing_if = "is_zero_u64")]
 *     polls: u64,
 * }
 * ```
 */

use std::collections::BTreeMap;

pub use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds, TimestampMilliSeconds};

/// Skip serializing if value is zero
#[inline]
pub const fn is_zero_u64(value: &u64) -> bool {
    *value == 0
}

/// Skip serializing if value is zero
#[inline]
pub const fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

/// Skip serializing if the map is empty
#[inline]
pub fn is_empty_map<K, V>(value: &BTreeMap<K, V>) -> bool {
    value.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(is_zero_u64(&0));
        assert!(!is_zero_u64(&1));
        assert!(is_zero_i64(&0));
        assert!(!is_zero_i64(&-1));
        assert!(is_empty_map::<u8, u8>(&BTreeMap::new()));
    }
}
