/*!
 * Graph Series
 *
 * Time series of one type family's population, read from stored snapshots.
 * The iterator borrows its input and never looks at the live registry;
 * cloning it restarts the sequence.
 */

use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::time::SystemTime;

/// One point of a population series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: SystemTime,
    pub count: u64,
}

/// Lazy series over the most recent `limit` snapshots, oldest first
///
/// Each point sums the counts of every type whose key contains the filter,
/// ignoring case.
#[derive(Debug)]
pub struct GraphSeries<'a, S> {
    window: std::slice::Iter<'a, S>,
    filter: String,
}

// Derived Clone would require `S: Clone`
impl<'a, S> Clone for GraphSeries<'a, S> {
    fn clone(&self) -> Self {
        Self {
            window: self.window.clone(),
            filter: self.filter.clone(),
        }
    }
}

impl<'a, S: Borrow<Snapshot>> GraphSeries<'a, S> {
    /// `snapshots` must already be in chronological order
    pub fn new(snapshots: &'a [S], filter: &str, limit: usize) -> Self {
        let start = snapshots.len().saturating_sub(limit);
        Self {
            window: snapshots[start..].iter(),
            filter: filter.to_lowercase(),
        }
    }

    fn point(&self, snapshot: &Snapshot) -> SeriesPoint {
        let count = snapshot
            .counts()
            .iter()
            .filter(|(key, _)| key.as_str().to_lowercase().contains(&self.filter))
            .map(|(_, count)| *count)
            .sum();

        SeriesPoint {
            timestamp: snapshot.timestamp(),
            count,
        }
    }
}

impl<'a, S: Borrow<Snapshot>> Iterator for GraphSeries<'a, S> {
    type Item = SeriesPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let snapshot = self.window.next()?;
        Some(self.point(snapshot.borrow()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.window.size_hint()
    }
}

impl<'a, S: Borrow<Snapshot>> ExactSizeIterator for GraphSeries<'a, S> {}
