//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.clipset.toml` files.

use crate::report::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".clipset.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Scanner settings.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Table output settings.
    #[serde(default)]
    pub table: TableConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Number of concurrent file analyses.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            concurrency: default_concurrency(),
        }
    }
}

fn default_output() -> String {
    "clipset_table.json".to_string()
}

fn default_concurrency() -> usize {
    crate::scheduler::DEFAULT_CONCURRENCY
}

/// Dataset scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Accepted media file extensions.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Maximum items to analyze.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            max_items: None,
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["mp4".to_string()]
}

/// Per-file analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Samples per second of source media.
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: u32,

    /// Per-file analysis timeout in seconds (unbounded when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sampling_rate: default_sampling_rate(),
            timeout_seconds: None,
        }
    }
}

fn default_sampling_rate() -> u32 {
    crate::pipeline::DEFAULT_SAMPLING_RATE
}

impl AnalysisConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// Table output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Add the full file path as a column.
    #[serde(default)]
    pub include_path: bool,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.to_string_lossy().to_string();
        }
        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(ref extensions) = args.extensions {
            self.scanner.extensions = extensions.clone();
        }
        if let Some(max_items) = args.max_items {
            self.scanner.max_items = Some(max_items);
        }

        if let Some(rate) = args.sampling_rate {
            self.analysis.sampling_rate = rate;
        }
        if let Some(timeout) = args.timeout {
            self.analysis.timeout_seconds = Some(timeout);
        }

        if let Some(format) = args.format {
            self.table.format = format;
        }
        if args.include_path {
            self.table.include_path = true;
        }
    }

    /// Check values a config file can get wrong.
    pub fn validate(&self) -> Result<()> {
        if self.general.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        if self.analysis.sampling_rate == 0 {
            anyhow::bail!("sampling_rate must be at least 1");
        }
        if self.analysis.timeout_seconds == Some(0) {
            anyhow::bail!("timeout_seconds must be at least 1");
        }
        if self.scanner.extensions.is_empty() {
            anyhow::bail!("at least one extension must be allowed");
        }
        Ok(())
    }

    /// Log level for this run. `quiet` wins over a verbose file or flag.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
