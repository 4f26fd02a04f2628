//! Processed tables.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::column::{Column, ColumnQuality};
use super::value::Value;

/// Name of the synthetic column recording where each row came from.
pub const ORIGIN_COLUMN: &str = "source_file";

/// A named collection of same-length columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Table name (file stem or sheet name).
    pub name: String,
    /// Columns in source order.
    pub columns: Vec<Column>,
}

impl Table {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Create a table with the given columns.
    pub fn with_columns(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get all column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.columns.get(col).and_then(|c| c.values.get(row))
    }

    /// Values of one row, in column order.
    pub fn row(&self, index: usize) -> Vec<&Value> {
        self.columns
            .iter()
            .map(|c| &c.values[index])
            .collect()
    }

    /// Iterate over all rows.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.row_count()).map(move |i| self.row(i))
    }

    /// Keep only the rows whose flag is set. `keep` must have one entry per row.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.row_count());
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column.values.retain(|_| *flags.next().unwrap_or(&false));
        }
    }
}

/// Quality summary for a whole table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableQuality {
    /// Table name.
    pub table: String,
    pub total_records: usize,
    pub total_columns: usize,
    /// Per-column summaries in column order.
    pub columns: IndexMap<String, ColumnQuality>,
}
