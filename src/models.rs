//! Data models for a dataset run.
//!
//! This module contains the items produced by a scan, the per-item
//! outcomes, and the summary that accompanies a finished table.

use crate::error::{AnalysisError, UnsupportedFormatError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One work item: a labeled media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetItem {
    /// Name of the label directory the file lives in.
    pub label: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// File name as it appears in the label directory.
    pub file_name: String,
    /// Position assigned at scan time; the slot this item owns in a result set.
    pub sequence_index: usize,
}

impl DatasetItem {
    pub fn new(label: impl Into<String>, path: PathBuf, sequence_index: usize) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            label: label.into(),
            path,
            file_name,
            sequence_index,
        }
    }
}

/// The ordered items produced by one scan.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Root directory that was scanned.
    pub root: PathBuf,
    /// Accepted items; `items[i].sequence_index == i`.
    pub items: Vec<DatasetItem>,
    /// Entries rejected by the extension allow-list.
    pub skipped: Vec<UnsupportedFormatError>,
}

impl Dataset {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            items: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append an accepted file, assigning it the next sequence index.
    pub fn push(&mut self, label: &str, path: PathBuf) -> &DatasetItem {
        let index = self.items.len();
        self.items.push(DatasetItem::new(label, path, index));
        &self.items[index]
    }

    /// Distinct labels in discovery order.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for item in &self.items {
            if labels.last() != Some(&item.label.as_str()) {
                labels.push(&item.label);
            }
        }
        labels
    }
}

/// The terminal result of one analysis task.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome<T> {
    pub item: DatasetItem,
    pub result: Result<T, AnalysisError>,
}

impl<T> AnalysisOutcome<T> {
    pub fn success(item: DatasetItem, payload: T) -> Self {
        Self {
            item,
            result: Ok(payload),
        }
    }

    pub fn failure(item: DatasetItem, error: AnalysisError) -> Self {
        Self {
            item,
            result: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// An item whose analysis failed, reported next to the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub label: String,
    pub file_name: String,
    pub path: PathBuf,
    pub sequence_index: usize,
    pub error: String,
}

impl FailedItem {
    pub fn new(item: &DatasetItem, error: &AnalysisError) -> Self {
        Self {
            label: item.label.clone(),
            file_name: item.file_name.clone(),
            path: item.path.clone(),
            sequence_index: item.sequence_index,
            error: error.to_string(),
        }
    }
}

/// Statistics describing a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Dataset root directory.
    pub root: PathBuf,
    /// Sampling rate handed to the analyzer.
    pub sampling_rate: u32,
    /// Items accepted by the scanner.
    pub items_discovered: usize,
    /// Items that produced a table row.
    pub items_analyzed: usize,
    /// Items whose analysis failed.
    pub items_failed: usize,
    /// Files rejected by the extension allow-list.
    pub files_skipped: usize,
    /// Rows per label.
    pub label_counts: BTreeMap<String, usize>,
    /// When the table was produced.
    pub generated_at: DateTime<Utc>,
    /// Wall-clock duration of the run in seconds.
    pub duration_seconds: f64,
}
