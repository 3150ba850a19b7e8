//! Outcome aggregation and statistics.
//!
//! This module turns the per-index outcomes of a run into the
//! index-corresponding sequences the table builder consumes, plus the
//! list of failed items.

use crate::error::AggregationError;
use crate::models::{AnalysisOutcome, FailedItem};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Successful outcomes split into parallel sequences, plus failures.
///
/// `labels[i]`, `file_names[i]`, `paths[i]` and `payloads[i]` always come
/// from the same outcome.
#[derive(Debug, Clone)]
pub struct AggregatedResult<T> {
    pub labels: Vec<String>,
    pub file_names: Vec<String>,
    pub paths: Vec<PathBuf>,
    pub payloads: Vec<T>,
    pub failures: Vec<FailedItem>,
}

impl<T> Default for AggregatedResult<T> {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            file_names: Vec::new(),
            paths: Vec::new(),
            payloads: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> AggregatedResult<T> {
    /// Number of successful rows.
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

/// Collect outcomes, ordered by sequence index, into an aggregated result.
///
/// Each success contributes its own item's label and file name next to its
/// payload, so rows cannot drift apart no matter the completion order.
/// Outcomes whose position does not match their sequence index are rejected.
pub fn collect<T>(
    outcomes: Vec<AnalysisOutcome<T>>,
) -> Result<AggregatedResult<T>, AggregationError> {
    let mut aggregated = AggregatedResult::default();

    for (position, outcome) in outcomes.into_iter().enumerate() {
        let AnalysisOutcome { item, result } = outcome;

        if item.sequence_index != position {
            return Err(AggregationError::Misaligned {
                position,
                found: item.sequence_index,
            });
        }

        match result {
            Ok(payload) => {
                aggregated.labels.push(item.label);
                aggregated.file_names.push(item.file_name);
                aggregated.paths.push(item.path);
                aggregated.payloads.push(payload);
            }
            Err(error) => aggregated.failures.push(FailedItem::new(&item, &error)),
        }
    }

    Ok(aggregated)
}

/// Count rows per label.
pub fn label_distribution(labels: &[String]) -> BTreeMap<String, usize> {
    let mut dist: BTreeMap<String, usize> = BTreeMap::new();

    for label in labels {
        *dist.entry(label.clone()).or_default() += 1;
    }

    dist
}

/// Group failed items by label.
pub fn failures_by_label(failures: &[FailedItem]) -> BTreeMap<String, Vec<&FailedItem>> {
    let mut grouped: BTreeMap<String, Vec<&FailedItem>> = BTreeMap::new();

    for failure in failures {
        grouped
            .entry(failure.label.clone())
            .or_default()
            .push(failure);
    }

    // Keep scan order within each label
    for items in grouped.values_mut() {
        items.sort_by_key(|f| f.sequence_index);
    }

    grouped
}
