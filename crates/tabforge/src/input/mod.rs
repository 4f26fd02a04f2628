//! Input parsing and data source handling.

mod excel;
mod json;
mod parser;
mod source;

use std::path::Path;

pub use excel::read_workbook;
pub use json::{read_json, table_from_json};
pub use parser::{Parser, ParserConfig};
pub use source::{RawTable, SourceMetadata};

pub(crate) use source::file_name;

/// Kind of source file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Delimited,
    Spreadsheet,
    Json,
}

impl SourceKind {
    /// Determine the source kind from a file extension (case-insensitive).
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Some(SourceKind::Delimited),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(SourceKind::Spreadsheet),
            "json" => Some(SourceKind::Json),
            _ => None,
        }
    }
}
