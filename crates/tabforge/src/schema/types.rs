//! Core type definitions for column classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Detected data type for a column.
///
/// Assigned once per column from the aggregate parse success rate of its
/// values; individual cells that do not fit become [`Value::Null`].
///
/// [`Value::Null`]: super::Value::Null
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Date and/or time values.
    Date,
    /// Whole numbers, nullable.
    Integer,
    /// Floating-point numbers.
    Decimal,
    /// Text values. Also the fallback when no other type qualifies.
    #[default]
    Text,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Decimal)
    }

    /// Returns true if this type is temporal.
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::Date)
    }

    /// Short lowercase label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Date => "date",
            ColumnType::Integer => "integer",
            ColumnType::Decimal => "decimal",
            ColumnType::Text => "text",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
