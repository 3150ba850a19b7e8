//! Table assembly and rendering.

pub mod generator;
pub mod table;

use serde::{Deserialize, Serialize};

pub use generator::{generate_csv, generate_json, generate_markdown, render};
pub use table::{Table, TableBuilder};

/// Output format for the generated table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON document with summary, columns, rows and failures (default)
    #[default]
    Json,
    /// Comma-separated values, one row per analyzed file
    Csv,
    /// Markdown report
    Markdown,
}
