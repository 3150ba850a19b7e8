//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Options left unset fall back to the
//! configuration file, then to built-in defaults.

use crate::report::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// Clipset - turn a directory of labeled media clips into a feature table
///
/// The dataset root holds one subdirectory per label; every media file in
/// a label directory is analyzed and becomes one row of the table.
///
/// Examples:
///   clipset --root ./clips
///   clipset --root ./clips --sampling-rate 15 --concurrency 8 --format csv -o table.csv
///   clipset --root ./clips --dry-run
///   clipset --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Dataset root directory (one subdirectory per label)
    #[arg(short, long, value_name = "DIR", required_unless_present = "init_config")]
    pub root: Option<PathBuf>,

    /// Samples per second of source media handed to the analyzer
    #[arg(short, long, value_name = "RATE", env = "CLIPSET_SAMPLING_RATE")]
    pub sampling_rate: Option<u32>,

    /// Number of concurrent file analyses (default: 3)
    #[arg(short = 'j', long, value_name = "NUM", env = "CLIPSET_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Output file path for the table
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (json, csv, markdown)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Accepted media file extensions (comma-separated)
    ///
    /// Example: --extensions mp4,mov
    #[arg(long, value_name = "EXTS", value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .clipset.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Per-file analysis timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum number of files to analyze
    #[arg(long, value_name = "COUNT")]
    pub max_items: Option<usize>,

    /// Add the full file path as a table column
    #[arg(long)]
    pub include_path: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: scan the dataset and list items without analyzing them
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with code 2 when any file fails analysis
    #[arg(long)]
    pub fail_on_errors: bool,

    /// Generate a default .clipset.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.root.is_none() {
            return Err("A dataset root is required (--root)".to_string());
        }

        if self.sampling_rate == Some(0) {
            return Err("Sampling rate must be at least 1".to_string());
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.max_items == Some(0) {
            return Err("Max items must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }
}
