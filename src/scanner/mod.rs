//! Dataset scanner for discovering labeled media files.
//!
//! The root directory holds one subdirectory per label; each label
//! directory holds the media files for that label. Hidden entries are
//! ignored at both levels and files are filtered by extension.

use crate::error::{DirectoryError, UnsupportedFormatError};
use crate::models::Dataset;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Configuration for dataset scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Accepted file extensions, without the dot (e.g., ["mp4"])
    pub extensions: Vec<String>,
    /// Maximum number of items to keep
    pub max_items: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["mp4".to_string()],
            max_items: None,
        }
    }
}

impl From<&crate::config::ScannerConfig> for ScanConfig {
    fn from(config: &crate::config::ScannerConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            max_items: config.max_items,
        }
    }
}

/// Scanner that turns a root directory into a [`Dataset`].
pub struct DatasetScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl DatasetScanner {
    /// Create a new dataset scanner.
    pub fn new(root: impl Into<PathBuf>, config: ScanConfig) -> Self {
        Self {
            config,
            root: root.into(),
        }
    }

    /// Scan the root and return every accepted item in discovery order.
    ///
    /// Labels are visited in file-name order and files within a label in
    /// file-name order, so an unchanged directory always yields the same
    /// sequence indices.
    pub fn scan(&self) -> Result<Dataset, DirectoryError> {
        let labels = self.list_labels()?;
        let mut dataset = Dataset::new(&self.root);

        for (label, label_path) in labels {
            let entries = list_children(&label_path).map_err(|source| {
                DirectoryError::UnreadableLabel {
                    label: label.clone(),
                    path: label_path.clone(),
                    source,
                }
            })?;

            for entry in entries {
                let path = entry.path();
                let name = entry.file_name().to_string_lossy();

                if is_hidden(&name) {
                    continue;
                }

                if entry.file_type().is_dir() {
                    debug!("Ignoring nested directory {}", path.display());
                    continue;
                }

                match self.check_format(path) {
                    Ok(()) => {
                        let item = dataset.push(&label, path.to_path_buf());
                        debug!(
                            "Item {}: {}/{}",
                            item.sequence_index, item.label, item.file_name
                        );
                    }
                    Err(skip) => {
                        warn!("Skipping {}", skip);
                        dataset.skipped.push(skip);
                    }
                }
            }
        }

        if let Some(max) = self.config.max_items {
            dataset.items.truncate(max);
        }

        info!(
            "Scanned {}: {} items, {} skipped",
            self.root.display(),
            dataset.len(),
            dataset.skipped.len()
        );

        Ok(dataset)
    }

    /// Check a file against the extension allow-list.
    pub fn check_format(&self, path: &Path) -> Result<(), UnsupportedFormatError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        if self
            .config
            .extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&ext))
        {
            Ok(())
        } else {
            Err(UnsupportedFormatError {
                path: path.to_path_buf(),
                extension: ext,
            })
        }
    }

    /// List label directories under the root. Failing to list the root is fatal.
    fn list_labels(&self) -> Result<Vec<(String, PathBuf)>, DirectoryError> {
        let invalid_root = |source| DirectoryError::InvalidRoot {
            path: self.root.clone(),
            source,
        };

        let metadata = std::fs::metadata(&self.root).map_err(invalid_root)?;
        if !metadata.is_dir() {
            return Err(invalid_root(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a directory",
            )));
        }

        let mut labels = Vec::new();
        for entry in list_children(&self.root).map_err(invalid_root)? {
            let name = entry.file_name().to_string_lossy().to_string();

            if is_hidden(&name) {
                continue;
            }

            if !entry.file_type().is_dir() {
                debug!("Ignoring non-directory {} at dataset root", name);
                continue;
            }

            labels.push((name, entry.into_path()));
        }

        Ok(labels)
    }
}

/// Immediate children of a directory, sorted by file name.
///
/// Only a failure to open `dir` itself is an error. Children that cannot be
/// read (dangling links, permission errors) are logged and left out.
fn list_children(dir: &Path) -> io::Result<Vec<DirEntry>> {
    let mut children = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) => children.push(entry),
            Err(e) if e.depth() == 0 => {
                let message = e.to_string();
                return Err(e
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message)));
            }
            Err(e) => warn!("Skipping unreadable entry in {}: {}", dir.display(), e),
        }
    }

    Ok(children)
}

/// Dot-prefixed names are hidden.
fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
