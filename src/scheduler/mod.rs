//! Bounded worker pool with a join barrier.
//!
//! The scheduler fans a dataset out into one analysis task per item, never
//! running more than the configured number at once. Every task ends by
//! writing its own result slot and arriving at the barrier; the scheduler
//! hands the result set back only after the barrier has counted every
//! item.

pub mod barrier;
pub mod result_set;

use crate::analysis::{AnalysisTask, Analyzer};
use crate::error::{AnalysisError, SchedulerError};
use crate::models::{AnalysisOutcome, Dataset, DatasetItem};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub use barrier::JoinBarrier;
pub use result_set::ResultSet;

/// Progress callback type (completed, total)
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Default number of concurrent analyses.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Scheduler configuration.
#[derive(Clone)]
pub struct SchedulerConfig {
    /// Maximum number of analyzer calls in flight
    pub concurrency: usize,
    /// Per-task limit on the analyzer call (None means unbounded)
    pub analysis_timeout: Option<Duration>,
    /// Called after every terminal write
    pub progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for SchedulerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerConfig")
            .field("concurrency", &self.concurrency)
            .field("analysis_timeout", &self.analysis_timeout)
            .field("has_progress_callback", &self.progress.is_some())
            .finish()
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            analysis_timeout: None,
            progress: None,
        }
    }
}

/// Runs analysis tasks for one dataset.
pub struct Scheduler {
    config: SchedulerConfig,
    permits: Arc<Semaphore>,
}

impl Scheduler {
    /// Create a scheduler. A concurrency of zero is rejected.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        if config.concurrency == 0 {
            return Err(SchedulerError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }

        let permits = Arc::new(Semaphore::new(config.concurrency));
        Ok(Self { config, permits })
    }

    pub fn concurrency(&self) -> usize {
        self.config.concurrency
    }

    /// Analyze every item of `dataset` and return the filled result set.
    ///
    /// A permit is taken before each task is spawned, so submission waits
    /// whenever all worker slots are busy. The result set is returned only
    /// after the join barrier has seen one terminal write per item.
    pub async fn run<A: Analyzer>(
        &self,
        dataset: &Dataset,
        analyzer: Arc<A>,
        sampling_rate: u32,
    ) -> Result<ResultSet<A::Output>, SchedulerError> {
        let total = dataset.len();
        let result_set = Arc::new(ResultSet::with_len(total));
        let barrier = Arc::new(JoinBarrier::new(total));
        let mut tasks = JoinSet::new();

        info!(
            "Scheduling {} items ({} at a time) with {}",
            total,
            self.concurrency(),
            analyzer.name()
        );

        for item in &dataset.items {
            let permit = self
                .permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| SchedulerError::PoolClosed)?;

            let task = AnalysisTask::new(item.clone(), analyzer.clone(), sampling_rate)
                .with_timeout(self.config.analysis_timeout);
            let slot = SlotWriter::new(
                task.item().clone(),
                result_set.clone(),
                barrier.clone(),
                self.config.progress.clone(),
            );

            tasks.spawn(async move {
                let _permit = permit;
                let outcome = task.run().await;
                slot.complete(outcome);
            });
        }

        barrier.wait().await;
        debug!("Join barrier released after {} terminal writes", barrier.arrived());

        // Every slot is written; reap the tasks so their handles are gone.
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!("Analysis task ended abnormally: {}", e);
            }
        }

        let result_set = Arc::try_unwrap(result_set).map_err(|_| SchedulerError::ResultSetShared)?;
        let written = result_set.written();
        if written != total {
            return Err(SchedulerError::IncompleteResultSet {
                missing: total - written,
            });
        }

        Ok(result_set)
    }
}

/// A task's exclusive handle on its result slot.
///
/// `complete` writes the slot and arrives at the barrier. If the task is
/// dropped first (panic or abort), the slot is filled with
/// [`AnalysisError::Aborted`] so the barrier count is never short.
struct SlotWriter<T> {
    item: DatasetItem,
    result_set: Option<Arc<ResultSet<T>>>,
    barrier: Arc<JoinBarrier>,
    progress: Option<ProgressCallback>,
}

impl<T> SlotWriter<T> {
    fn new(
        item: DatasetItem,
        result_set: Arc<ResultSet<T>>,
        barrier: Arc<JoinBarrier>,
        progress: Option<ProgressCallback>,
    ) -> Self {
        Self {
            item,
            result_set: Some(result_set),
            barrier,
            progress,
        }
    }

    fn complete(mut self, outcome: AnalysisOutcome<T>) {
        self.write(outcome);
    }

    fn write(&mut self, outcome: AnalysisOutcome<T>) {
        let Some(result_set) = self.result_set.take() else {
            return;
        };

        if result_set.record(outcome).is_err() {
            error!(
                "Result slot {} rejected a second outcome",
                self.item.sequence_index
            );
        }

        // Release the result set before arriving so the scheduler owns it
        // alone once the barrier opens.
        drop(result_set);

        let completed = self.barrier.arrive();
        if let Some(ref progress) = self.progress {
            progress(completed, self.barrier.expected());
        }
    }
}

impl<T> Drop for SlotWriter<T> {
    fn drop(&mut self) {
        if self.result_set.is_some() {
            warn!(
                "Analysis task for {} ended without an outcome",
                self.item.path.display()
            );
            let outcome = AnalysisOutcome::failure(self.item.clone(), AnalysisError::Aborted);
            self.write(outcome);
        }
    }
}
