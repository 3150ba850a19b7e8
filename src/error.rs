//! Error types for every stage of a run.
//!
//! Scan and aggregation failures are fatal for the whole run; analysis
//! failures are per item and travel as data inside the result set.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal scan-phase failure. No work is scheduled once one of these occurs.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("cannot list dataset root {}: {source}", path.display())]
    InvalidRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot list label directory '{label}' ({}): {source}", path.display())]
    UnreadableLabel {
        label: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file the scanner skipped because its extension is not allowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported format '{extension}': {}", path.display())]
pub struct UnsupportedFormatError {
    pub path: PathBuf,
    /// Lowercased extension without the dot, empty when the file has none.
    pub extension: String,
}

/// Per-item analysis failure, recorded in the item's result slot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("analysis failed: {0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("analysis timed out after {limit:?}")]
    TimedOut { limit: Duration },

    #[error("analysis task panicked: {0}")]
    Panicked(String),

    #[error("analysis task was aborted before recording an outcome")]
    Aborted,
}

impl From<std::io::Error> for AnalysisError {
    fn from(e: std::io::Error) -> Self {
        AnalysisError::Io(e.to_string())
    }
}

/// Scheduler-level fault: the result set is not complete after the barrier.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("result set incomplete after join barrier: {missing} slot(s) unwritten")]
    IncompleteResultSet { missing: usize },

    #[error("result set still shared after join barrier")]
    ResultSetShared,

    #[error("worker pool closed while tasks were pending")]
    PoolClosed,

    #[error("invalid scheduler configuration: {0}")]
    InvalidConfig(String),
}

/// The outcomes handed to the aggregator do not line up with the dataset.
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("outcome at position {position} belongs to item {found}")]
    Misaligned { position: usize, found: usize },
}

/// Table construction failure.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error(
        "column lengths disagree: {labels} labels, {file_names} file names, {payloads} payloads"
    )]
    LengthMismatch {
        labels: usize,
        file_names: usize,
        payloads: usize,
    },

    #[error("payload at row {index} is not a table row: {reason}")]
    InvalidPayload { index: usize, reason: String },
}

/// Terminal error of a `generate` run.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("generate task ended without delivering a result")]
    Dropped,
}
