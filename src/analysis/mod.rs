//! Per-item analysis.
//!
//! The [`Analyzer`] trait is the seam to whatever turns one media file
//! into a payload. [`AnalysisTask`] wraps a single call and always
//! produces exactly one outcome.

pub mod aggregator;
pub mod profile;
pub mod task;

use crate::error::AnalysisError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

pub use aggregator::{collect, failures_by_label, label_distribution, AggregatedResult};
pub use profile::{ByteProfile, ByteProfileAnalyzer};
pub use task::AnalysisTask;

/// Turns one file into a serializable payload.
///
/// Implementations must be safe to call concurrently on different files.
/// The payload must serialize to a JSON object; its fields become table
/// columns.
#[async_trait]
pub trait Analyzer: Send + Sync + 'static {
    type Output: Serialize + Send + Sync + 'static;

    /// Analyze `path`, sampling the source at `sampling_rate` samples per second.
    async fn analyze(&self, path: &Path, sampling_rate: u32)
        -> Result<Self::Output, AnalysisError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "analyzer"
    }
}
