/*!
 * Watch Types
 */

use crate::analysis::TrendStatus;
use crate::core::serde::{
    is_zero_i64, is_zero_u64, serde_as, DurationMilliSeconds, TimestampMilliSeconds,
};
use crate::core::types::TypeKey;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Lifecycle of a watch; `Stopped` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    Active,
    Stopped,
}

/// Returned by `start_watch`
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WatchHandle {
    pub id: Uuid,
    pub key: TypeKey,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "interval_ms")]
    pub interval: Duration,
}

/// Current record of one watch
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WatchedType {
    pub id: Uuid,
    pub key: TypeKey,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "interval_ms")]
    pub interval: Duration,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub started_at: SystemTime,
    pub last_count: u64,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub last_delta: i64,
    pub last_status: TrendStatus,
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub polls: u64,
    pub state: WatchState,
}

impl WatchedType {
    pub(crate) fn new(handle: &WatchHandle, baseline: u64) -> Self {
        Self {
            id: handle.id,
            key: handle.key.clone(),
            interval: handle.interval,
            started_at: SystemTime::now(),
            last_count: baseline,
            last_delta: 0,
            last_status: TrendStatus::Stable,
            polls: 0,
            state: WatchState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == WatchState::Active
    }
}

/// Emitted after every poll
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WatchEvent {
    pub watch_id: Uuid,
    pub key: TypeKey,
    pub count: u64,
    pub delta: i64,
    pub status: TrendStatus,
    /// 1-based poll number
    pub poll: u64,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub timestamp: SystemTime,
}
