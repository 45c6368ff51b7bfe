/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::TypeKey;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Census errors with serialization support
///
/// None of these are fatal to the host: the worst outcome of any of them
/// is a skipped cycle or an empty result.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum CensusError {
    #[error("Snapshot unusable: {0}")]
    #[diagnostic(
        code(census::snapshot_unusable),
        help("The snapshot record is missing a required map or is not valid JSON.")
    )]
    SnapshotUnusable(String),

    #[error("Already watching {0}")]
    #[diagnostic(
        code(census::already_watching),
        help("Stop the existing watch before starting a new one for this type.")
    )]
    AlreadyWatching(TypeKey),

    #[error("{0} is not watched")]
    #[diagnostic(
        code(census::not_watched),
        help("List active watches to see which types are being polled.")
    )]
    NotWatched(TypeKey),

    #[error("Invalid watch interval for {0}: interval must be non-zero")]
    #[diagnostic(code(census::invalid_interval))]
    InvalidInterval(TypeKey),

    #[error("Capture failed: {0}")]
    #[diagnostic(
        code(census::capture_failed),
        help("The cycle was abandoned; previously stored snapshots are unaffected.")
    )]
    CaptureFailed(String),

    #[error("A capture cycle is already running")]
    #[diagnostic(
        code(census::capture_in_progress),
        help("Wait for the running capture to finish and retry.")
    )]
    CaptureInProgress,

    #[error("No async runtime available to schedule background work")]
    #[diagnostic(
        code(census::no_runtime),
        help("Call this from within a tokio runtime.")
    )]
    NoRuntime,

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(census::configuration_error),
        help("Invalid configuration. Review configuration parameters.")
    )]
    Configuration(String),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(census::serialization_error))]
    Serialization(String),
}

impl From<serde_json::Error> for CensusError {
    fn from(err: serde_json::Error) -> Self {
        CensusError::Serialization(err.to_string())
    }
}

/// Serializable error representation for host-facing responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SerializableError {
    pub error_type: String,
    pub message: String,
}

impl From<&CensusError> for SerializableError {
    fn from(err: &CensusError) -> Self {
        let error_type = match err {
            CensusError::SnapshotUnusable(_) => "snapshot_unusable",
            CensusError::AlreadyWatching(_) => "already_watching",
            CensusError::NotWatched(_) => "not_watched",
            CensusError::InvalidInterval(_) => "invalid_interval",
            CensusError::CaptureFailed(_) => "capture_failed",
            CensusError::CaptureInProgress => "capture_in_progress",
            CensusError::NoRuntime => "no_runtime",
            CensusError::Configuration(_) => "configuration_error",
            CensusError::Serialization(_) => "serialization_error",
        };
        Self {
            error_type: error_type.to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for census operations
pub type Result<T> = std::result::Result<T, CensusError>;
