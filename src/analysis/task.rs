//! A single unit of analysis work.

use super::Analyzer;
use crate::error::AnalysisError;
use crate::models::{AnalysisOutcome, DatasetItem};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One dataset item bound to the analyzer that will process it.
pub struct AnalysisTask<A: Analyzer> {
    item: DatasetItem,
    analyzer: Arc<A>,
    sampling_rate: u32,
    timeout: Option<Duration>,
}

impl<A: Analyzer> AnalysisTask<A> {
    pub fn new(item: DatasetItem, analyzer: Arc<A>, sampling_rate: u32) -> Self {
        Self {
            item,
            analyzer,
            sampling_rate,
            timeout: None,
        }
    }

    /// Bound the analyzer call; an overrun is recorded as a failure.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn item(&self) -> &DatasetItem {
        &self.item
    }

    /// Run the analyzer and wrap whatever happens into an outcome.
    ///
    /// Errors, timeouts and panics inside the analyzer all become
    /// failure outcomes; this never returns without one.
    pub async fn run(self) -> AnalysisOutcome<A::Output> {
        let path = self.item.path.as_path();
        debug!(
            "[{}] {} analyzing {}/{}",
            self.item.sequence_index,
            self.analyzer.name(),
            self.item.label,
            self.item.file_name
        );

        let call = AssertUnwindSafe(self.analyzer.analyze(path, self.sampling_rate)).catch_unwind();

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(finished) => flatten(finished),
                Err(_) => Err(AnalysisError::TimedOut { limit }),
            },
            None => flatten(call.await),
        };

        if let Err(ref e) = result {
            warn!("Analysis failed for {}: {}", self.item.path.display(), e);
        }

        AnalysisOutcome {
            item: self.item,
            result,
        }
    }
}

fn flatten<T>(
    finished: Result<Result<T, AnalysisError>, Box<dyn Any + Send>>,
) -> Result<T, AnalysisError> {
    match finished {
        Ok(result) => result,
        Err(panic) => Err(AnalysisError::Panicked(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
