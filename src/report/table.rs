//! Table assembly from aggregated results.

use crate::analysis::AggregatedResult;
use crate::error::FormatError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

pub const LABEL_COLUMN: &str = "label";
pub const FILENAME_COLUMN: &str = "filename";
pub const PATH_COLUMN: &str = "path";

/// A rectangular table: named columns and rows of JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Rows as column-name → value maps.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

/// Builds a [`Table`] from index-corresponding sequences.
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    include_path: bool,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `path` column after `filename`.
    pub fn include_path(mut self, include: bool) -> Self {
        self.include_path = include;
        self
    }

    /// Build a table from labels, file names and payloads of equal length.
    pub fn build<T: Serialize>(
        &self,
        labels: &[String],
        file_names: &[String],
        payloads: &[T],
    ) -> Result<Table, FormatError> {
        self.assemble(labels, file_names, None, payloads)
    }

    /// Build a table from an aggregated result.
    pub fn build_from<T: Serialize>(
        &self,
        aggregated: &AggregatedResult<T>,
    ) -> Result<Table, FormatError> {
        let paths = self.include_path.then_some(aggregated.paths.as_slice());
        self.assemble(
            &aggregated.labels,
            &aggregated.file_names,
            paths,
            &aggregated.payloads,
        )
    }

    fn assemble<T: Serialize>(
        &self,
        labels: &[String],
        file_names: &[String],
        paths: Option<&[PathBuf]>,
        payloads: &[T],
    ) -> Result<Table, FormatError> {
        let paths_match = paths.map_or(true, |p| p.len() == payloads.len());
        if labels.len() != payloads.len() || file_names.len() != payloads.len() || !paths_match {
            return Err(FormatError::LengthMismatch {
                labels: labels.len(),
                file_names: file_names.len(),
                payloads: payloads.len(),
            });
        }

        let mut columns = vec![LABEL_COLUMN.to_string(), FILENAME_COLUMN.to_string()];
        if paths.is_some() {
            columns.push(PATH_COLUMN.to_string());
        }
        let fixed = columns.len();

        let mut records = Vec::with_capacity(payloads.len());
        for (index, payload) in payloads.iter().enumerate() {
            let fields = payload_fields(index, payload)?;

            for key in fields.keys() {
                if columns[..fixed].contains(key) {
                    return Err(FormatError::InvalidPayload {
                        index,
                        reason: format!("field '{}' collides with a reserved column", key),
                    });
                }
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }

            records.push(fields);
        }

        let rows = records
            .into_iter()
            .enumerate()
            .map(|(i, mut fields)| {
                let mut row = Vec::with_capacity(columns.len());
                row.push(Value::String(labels[i].clone()));
                row.push(Value::String(file_names[i].clone()));
                if let Some(paths) = paths {
                    row.push(Value::String(paths[i].to_string_lossy().to_string()));
                }
                for column in &columns[fixed..] {
                    row.push(fields.remove(column).unwrap_or(Value::Null));
                }
                row
            })
            .collect();

        Ok(Table { columns, rows })
    }
}

fn payload_fields<T: Serialize>(index: usize, payload: &T) -> Result<Map<String, Value>, FormatError> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(FormatError::InvalidPayload {
            index,
            reason: format!("expected an object, got {}", kind_of(&other)),
        }),
        Err(e) => Err(FormatError::InvalidPayload {
            index,
            reason: e.to_string(),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
