//! Clipset - labeled media directory to feature table.
//!
//! Scans a dataset root (one subdirectory per label), analyzes every
//! accepted media file on a bounded worker pool, waits for all analyses at
//! a join barrier, and assembles one table row per successful file.
//! Plug in any [`Analyzer`]; [`ByteProfileAnalyzer`] ships as a default.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod scanner;
pub mod scheduler;

pub use analysis::{Analyzer, ByteProfile, ByteProfileAnalyzer};
pub use error::{
    AggregationError, AnalysisError, DirectoryError, FormatError, GenerateError, SchedulerError,
    UnsupportedFormatError,
};
pub use models::{AnalysisOutcome, Dataset, DatasetItem, FailedItem, RunSummary};
pub use pipeline::{generate, spawn_generate, GenerateOptions, Generated};
pub use report::{OutputFormat, Table, TableBuilder};
pub use scanner::{DatasetScanner, ScanConfig};
pub use scheduler::{JoinBarrier, ResultSet, Scheduler, SchedulerConfig};
