/*!
 * Census Configuration
 *
 * All tunables consumed by the census algorithms. Loading and persisting
 * configuration belongs to the host; this module only provides defaults,
 * an environment overlay and validation.
 *
 * Environment variables (all optional):
 * - CENSUS_SPIKE_MEMORY_MB: estimated-memory growth that counts as a spike
 * - CENSUS_SPIKE_INSTANCES: instance-count growth that counts as a spike
 * - CENSUS_CHECK_INTERVAL_SECS: spike monitor period
 * - CENSUS_REPORT_FLOOR_MB: memory report floor
 * - CENSUS_IGNORE: comma-separated type-name fragments to ignore in alerts
 * - CENSUS_INDIVIDUAL_TRACKING: capture per-instance detail (true/false)
 * - CENSUS_VERBOSE_DIFF: include counts and bytes in rendered diffs
 * - CENSUS_LEAK_THRESHOLD / CENSUS_GROW_THRESHOLD / CENSUS_SHRINK_THRESHOLD
 * - CENSUS_HISTORY_CAPACITY: snapshots kept in memory
 */

use crate::analysis::{IgnoreList, SpikeClassifier, SpikeRules};
use crate::core::limits::*;
use crate::core::serde::{serde_as, DurationSeconds};
use crate::core::{CensusError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Census configuration
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CensusConfig {
    pub spike_memory_threshold_mb: u64,
    pub spike_instance_threshold: u64,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "check_interval_secs")]
    pub check_interval: Duration,
    pub report_floor_mb: u64,
    pub ignore_fragments: Vec<String>,
    pub individual_tracking: bool,
    pub verbose_diff: bool,
    pub leak_threshold: i64,
    pub grow_threshold: i64,
    pub shrink_threshold: i64,
    pub history_capacity: usize,
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            spike_memory_threshold_mb: DEFAULT_SPIKE_MEMORY_THRESHOLD_MB,
            spike_instance_threshold: DEFAULT_SPIKE_INSTANCE_THRESHOLD,
            check_interval: DEFAULT_CHECK_INTERVAL,
            report_floor_mb: DEFAULT_REPORT_FLOOR_MB,
            ignore_fragments: Vec::new(),
            individual_tracking: false,
            verbose_diff: false,
            leak_threshold: DEFAULT_LEAK_THRESHOLD,
            grow_threshold: DEFAULT_GROW_THRESHOLD,
            shrink_threshold: DEFAULT_SHRINK_THRESHOLD,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl CensusConfig {
    /// Defaults overlaid with any `CENSUS_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "CENSUS_SPIKE_MEMORY_MB")? {
            config.spike_memory_threshold_mb = v;
        }
        if let Some(v) = parse_var(&lookup, "CENSUS_SPIKE_INSTANCES")? {
            config.spike_instance_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, "CENSUS_CHECK_INTERVAL_SECS")? {
            config.check_interval = Duration::from_secs(v);
        }
        if let Some(v) = parse_var(&lookup, "CENSUS_REPORT_FLOOR_MB")? {
            config.report_floor_mb = v;
        }
        if let Some(raw) = lookup("CENSUS_IGNORE") {
            config.ignore_fragments = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = parse_var(&lookup, "CENSUS_INDIVIDUAL_TRACKING")? {
            config.individual_tracking = v;
        }
        if let Some(v) = parse_var(&lookup, "CENSUS_VERBOSE_DIFF")? {
            config.verbose_diff = v;
        }
        if let Some(v) = parse_var(&lookup, "CENSUS_LEAK_THRESHOLD")? {
            config.leak_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, "CENSUS_GROW_THRESHOLD")? {
            config.grow_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, "CENSUS_SHRINK_THRESHOLD")? {
            config.shrink_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, "CENSUS_HISTORY_CAPACITY")? {
            config.history_capacity = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations the schedulers and classifiers cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.check_interval.is_zero() {
            return Err(CensusError::Configuration(
                "check interval must be at least one second".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(CensusError::Configuration(
                "history capacity must be non-zero".into(),
            ));
        }
        if self.grow_threshold <= 0 || self.leak_threshold < self.grow_threshold {
            return Err(CensusError::Configuration(format!(
                "expected 0 < grow ({}) <= leak ({})",
                self.grow_threshold, self.leak_threshold
            )));
        }
        if self.shrink_threshold >= 0 {
            return Err(CensusError::Configuration(format!(
                "shrink threshold must be negative, got {}",
                self.shrink_threshold
            )));
        }
        Ok(())
    }

    /// Watch trend classifier built from the configured thresholds
    pub fn classifier(&self) -> SpikeClassifier {
        SpikeClassifier::new(
            self.leak_threshold,
            self.grow_threshold,
            self.shrink_threshold,
        )
    }

    /// Spike rules for the alert loop
    pub fn spike_rules(&self) -> SpikeRules {
        SpikeRules {
            instance_threshold: self.spike_instance_threshold,
            memory_threshold_bytes: self.spike_memory_threshold_mb.saturating_mul(BYTES_PER_MB),
        }
    }

    /// Ignore predicate for alerting routines
    pub fn ignore_list(&self) -> IgnoreList {
        IgnoreList::new(self.ignore_fragments.iter().cloned())
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| CensusError::Configuration(format!("{}={:?}: {}", name, raw, e))),
    }
}
