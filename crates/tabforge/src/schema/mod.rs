//! Cell values, columns and tables.

mod column;
mod table;
mod types;
mod value;

pub use column::{Column, ColumnQuality, DateStatistics, NumericStatistics};
pub use table::{ORIGIN_COLUMN, Table, TableQuality};
pub use types::ColumnType;
pub use value::{DATE_FORMAT, DATETIME_FORMAT, Value, ValueKey, format_iso};
