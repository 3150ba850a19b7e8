//! Report generation.
//!
//! This module renders a generated table as JSON, CSV or Markdown.

use super::OutputFormat;
use crate::analysis::failures_by_label;
use crate::error::UnsupportedFormatError;
use crate::models::{FailedItem, RunSummary};
use crate::pipeline::Generated;
use crate::report::table::Table;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use std::path::Path;

/// Render a generated table in the requested format.
pub fn render(generated: &Generated, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => generate_json(generated),
        OutputFormat::Csv => generate_csv(&generated.table),
        OutputFormat::Markdown => Ok(generate_markdown(generated)),
    }
}

/// Write a rendered table to a file.
pub fn write_report(generated: &Generated, format: OutputFormat, path: &Path) -> Result<()> {
    let content = render(generated, format)?;

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    summary: &'a RunSummary,
    columns: &'a [String],
    rows: &'a [Vec<Value>],
    failures: &'a [FailedItem],
    skipped: Vec<String>,
}

/// Generate a JSON document.
pub fn generate_json(generated: &Generated) -> Result<String> {
    let document = JsonDocument {
        summary: &generated.summary,
        columns: &generated.table.columns,
        rows: &generated.table.rows,
        failures: &generated.failures,
        skipped: skipped_paths(&generated.skipped),
    };

    serde_json::to_string_pretty(&document).map_err(Into::into)
}

/// Generate CSV: a header record, then one record per row.
pub fn generate_csv(table: &Table) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(cell_text))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;

    Ok(String::from_utf8(bytes)?)
}

/// Generate a complete Markdown report.
pub fn generate_markdown(generated: &Generated) -> String {
    let mut output = String::new();

    output.push_str("# Clipset Report\n\n");
    output.push_str(&generate_metadata_section(&generated.summary));
    output.push_str(&generate_summary_section(&generated.summary));
    output.push_str(&generate_table_section(&generated.table));
    output.push_str(&generate_failures_section(&generated.failures));
    output.push_str(&generate_skipped_section(&generated.skipped));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(summary: &RunSummary) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** `{}`\n", summary.root.display()));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Sampling Rate:** {} samples/s\n",
        summary.sampling_rate
    ));
    section.push_str(&format!("- **Items Analyzed:** {}\n", summary.items_analyzed));
    if summary.items_failed > 0 {
        section.push_str(&format!("- **Items Failed:** {}\n", summary.items_failed));
    }
    if summary.files_skipped > 0 {
        section.push_str(&format!("- **Files Skipped:** {}\n", summary.files_skipped));
    }
    section.push_str(&format!("- **Duration:** {:.1}s\n", summary.duration_seconds));
    section.push('\n');

    section
}

/// Generate the per-label summary section.
fn generate_summary_section(summary: &RunSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    if summary.label_counts.is_empty() {
        section.push_str("No rows were produced.\n\n");
        return section;
    }

    section.push_str("| Label | Rows |\n");
    section.push_str("|:---|:---:|\n");

    let mut labels: Vec<_> = summary.label_counts.iter().collect();
    labels.sort_by_key(|(_, count)| std::cmp::Reverse(*count));

    for (label, count) in labels {
        section.push_str(&format!("| {} | {} |\n", label, count));
    }
    section.push('\n');

    section
}

/// Generate the table section.
fn generate_table_section(table: &Table) -> String {
    let mut section = String::new();

    section.push_str("## Table\n\n");

    section.push_str(&format!("| {} |\n", table.columns.join(" | ")));
    section.push_str(&format!(
        "|{}\n",
        table.columns.iter().map(|_| ":---|").collect::<String>()
    ));

    for row in &table.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|v| cell_text(v).replace('|', "\\|"))
            .collect();
        section.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    section.push('\n');

    section
}

/// Generate the failures section, grouped by label.
fn generate_failures_section(failures: &[FailedItem]) -> String {
    if failures.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Failures\n\n");

    for (label, items) in failures_by_label(failures) {
        section.push_str(&format!("### {}\n\n", label));
        for item in items {
            section.push_str(&format!("- `{}`: {}\n", item.file_name, item.error));
        }
        section.push('\n');
    }

    section
}

/// Generate the skipped-files section.
fn generate_skipped_section(skipped: &[UnsupportedFormatError]) -> String {
    if skipped.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Skipped Files\n\n");
    for path in skipped_paths(skipped) {
        section.push_str(&format!("- `{}`\n", path));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by clipset*\n".to_string()
}

fn skipped_paths(skipped: &[UnsupportedFormatError]) -> Vec<String> {
    skipped
        .iter()
        .map(|s| s.path.to_string_lossy().to_string())
        .collect()
}

/// Plain text of a cell: strings unquoted, null empty, the rest as JSON.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
