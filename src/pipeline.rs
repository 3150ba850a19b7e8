//! End-to-end generation: scan, analyze, join, aggregate, build.
//!
//! [`generate`] resolves to exactly one terminal value per call. A scan
//! failure returns before any analysis task is created.

use crate::analysis::{self, Analyzer};
use crate::error::{GenerateError, UnsupportedFormatError};
use crate::models::{FailedItem, RunSummary};
use crate::report::table::{Table, TableBuilder};
use crate::scanner::{DatasetScanner, ScanConfig};
use crate::scheduler::{ProgressCallback, Scheduler, SchedulerConfig, DEFAULT_CONCURRENCY};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Default sampling rate in samples per second.
pub const DEFAULT_SAMPLING_RATE: u32 = 30;

/// Parameters of one run.
#[derive(Clone)]
pub struct GenerateOptions {
    pub root: PathBuf,
    pub sampling_rate: u32,
    pub concurrency: usize,
    pub scan: ScanConfig,
    pub analysis_timeout: Option<Duration>,
    pub include_path: bool,
    pub progress: Option<ProgressCallback>,
}

impl GenerateOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sampling_rate: DEFAULT_SAMPLING_RATE,
            concurrency: DEFAULT_CONCURRENCY,
            scan: ScanConfig::default(),
            analysis_timeout: None,
            include_path: false,
            progress: None,
        }
    }

    pub fn sampling_rate(mut self, rate: u32) -> Self {
        self.sampling_rate = rate;
        self
    }

    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit;
        self
    }

    pub fn scan_config(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    /// Reject values no run can use.
    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.sampling_rate == 0 {
            return Err(GenerateError::InvalidOptions(
                "sampling rate must be at least 1".to_string(),
            ));
        }
        if self.scan.extensions.is_empty() {
            return Err(GenerateError::InvalidOptions(
                "at least one extension must be allowed".to_string(),
            ));
        }
        Ok(())
    }
}

/// The table plus everything reported alongside it.
#[derive(Debug, Clone)]
pub struct Generated {
    pub table: Table,
    pub failures: Vec<FailedItem>,
    pub skipped: Vec<UnsupportedFormatError>,
    pub summary: RunSummary,
}

/// Scan `options.root`, analyze every item, and build the table.
///
/// Items whose analysis fails are left out of the table and listed in
/// [`Generated::failures`].
pub async fn generate<A: Analyzer>(
    options: GenerateOptions,
    analyzer: Arc<A>,
) -> Result<Generated, GenerateError> {
    let start = Instant::now();

    options.validate()?;
    let scheduler = Scheduler::new(SchedulerConfig {
        concurrency: options.concurrency,
        analysis_timeout: options.analysis_timeout,
        progress: options.progress.clone(),
    })?;

    let dataset = DatasetScanner::new(&options.root, options.scan.clone()).scan()?;

    let result_set = scheduler
        .run(&dataset, analyzer, options.sampling_rate)
        .await?;

    let aggregated = analysis::collect(result_set.into_outcomes()?)?;
    let table = TableBuilder::new()
        .include_path(options.include_path)
        .build_from(&aggregated)?;

    if !aggregated.failures.is_empty() {
        warn!(
            "{} of {} items failed analysis",
            aggregated.failures.len(),
            dataset.len()
        );
    }

    let summary = RunSummary {
        root: dataset.root.clone(),
        sampling_rate: options.sampling_rate,
        items_discovered: dataset.len(),
        items_analyzed: table.len(),
        items_failed: aggregated.failures.len(),
        files_skipped: dataset.skipped.len(),
        label_counts: analysis::label_distribution(&aggregated.labels),
        generated_at: Utc::now(),
        duration_seconds: start.elapsed().as_secs_f64(),
    };

    info!(
        "Built table with {} rows from {} items in {:.2}s",
        summary.items_analyzed, summary.items_discovered, summary.duration_seconds
    );

    Ok(Generated {
        table,
        failures: aggregated.failures,
        skipped: dataset.skipped,
        summary,
    })
}

/// Run [`generate`] on the current runtime and deliver its single result
/// through a one-shot channel.
pub fn spawn_generate<A: Analyzer>(
    options: GenerateOptions,
    analyzer: Arc<A>,
) -> oneshot::Receiver<Result<Generated, GenerateError>> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let result = generate(options, analyzer).await;
        if tx.send(result).is_err() {
            warn!("Generate result dropped: receiver went away");
        }
    });

    rx
}

/// Await a result delivered by [`spawn_generate`].
pub async fn receive(
    rx: oneshot::Receiver<Result<Generated, GenerateError>>,
) -> Result<Generated, GenerateError> {
    rx.await.unwrap_or(Err(GenerateError::Dropped))
}
