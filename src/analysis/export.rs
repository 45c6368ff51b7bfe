/*!
 * Tabular Export
 *
 * Two-column rows for spreadsheet export and the per-type memory report.
 */

use super::diff::TypeDelta;
use crate::core::limits::BYTES_PER_MB;
use crate::core::types::TypeKey;
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// `(type, value)` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularRow {
    pub key: TypeKey,
    pub value: i64,
}

/// One row per type with a non-zero count, alphabetical
pub fn count_rows(snapshot: &Snapshot) -> Vec<TabularRow> {
    snapshot
        .counts()
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(key, count)| TabularRow {
            key: key.clone(),
            value: i64::try_from(*count).unwrap_or(i64::MAX),
        })
        .collect()
}

/// One row per non-zero delta, in the order given
pub fn delta_rows(entries: &[TypeDelta]) -> Vec<TabularRow> {
    entries
        .iter()
        .filter(|e| e.delta != 0)
        .map(|e| TabularRow {
            key: e.key.clone(),
            value: e.delta,
        })
        .collect()
}

/// CSV text with a header line
pub fn to_csv(rows: &[TabularRow], header: (&str, &str)) -> String {
    let mut out = String::with_capacity(32 * (rows.len() + 1));
    let _ = writeln!(out, "{},{}", csv_field(header.0), csv_field(header.1));
    for row in rows {
        let _ = writeln!(out, "{},{}", csv_field(row.key.as_str()), row.value);
    }
    out
}

fn csv_field(value: &str) -> std::borrow::Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\"")).into()
    } else {
        value.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MemoryReportEntry {
    pub key: TypeKey,
    pub count: u64,
    pub estimated_bytes: u64,
}

impl MemoryReportEntry {
    pub fn megabytes(&self) -> f64 {
        self.estimated_bytes as f64 / BYTES_PER_MB as f64
    }
}

/// Types whose estimated memory is at least `floor_mb`, largest first
pub fn memory_report(snapshot: &Snapshot, floor_mb: u64) -> Vec<MemoryReportEntry> {
    let floor = floor_mb.saturating_mul(BYTES_PER_MB);

    let mut entries: Vec<MemoryReportEntry> = snapshot
        .estimated_memory_bytes_per_type()
        .iter()
        .filter(|(_, bytes)| **bytes >= floor)
        .map(|(key, bytes)| MemoryReportEntry {
            key: key.clone(),
            count: snapshot.count(key.as_str()),
            estimated_bytes: *bytes,
        })
        .collect();

    entries.sort_by(|a, b| b.estimated_bytes.cmp(&a.estimated_bytes));
    entries
}
