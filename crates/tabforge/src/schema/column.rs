//! Column definition and quality statistics.

use serde::{Deserialize, Serialize};

use super::types::ColumnType;
use super::value::Value;

/// A named, typed column of cell values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Detected data type.
    pub column_type: ColumnType,
    /// Cell values in row order.
    pub values: Vec<Value>,
}

impl Column {
    /// Create a new column.
    pub fn new(name: impl Into<String>, column_type: ColumnType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            column_type,
            values,
        }
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of null values.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }
}

/// Quality summary computed for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnQuality {
    /// Detected data type.
    pub detected_type: ColumnType,
    /// Number of null/missing values.
    pub null_count: usize,
    /// Number of distinct non-null values.
    pub unique_count: usize,
    /// Percentage of non-null values, rounded to two decimals.
    pub completeness: f64,
    /// Statistics for integer and decimal columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericStatistics>,
    /// Range for date columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<DateStatistics>,
}

/// Statistics for numeric columns. Fields are `None` when every value is null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Earliest and latest values of a date column, as ISO-8601 strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateStatistics {
    pub min_date: Option<String>,
    pub max_date: Option<String>,
}
