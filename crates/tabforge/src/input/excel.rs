//! Spreadsheet reader: every non-empty sheet becomes one raw table.

use std::path::Path;

use calamine::{Data, DataType, Reader, open_workbook_auto};
use tracing::debug;

use crate::error::Result;
use crate::schema::Value;

use super::source::{RawTable, SourceMetadata, file_name, read_source};

/// Read all sheets of a workbook.
pub fn read_workbook(path: impl AsRef<Path>) -> Result<(Vec<RawTable>, SourceMetadata)> {
    let path = path.as_ref();
    let source = read_source(path)?;
    let file = file_name(path);

    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names().to_owned();

    let mut tables = Vec::with_capacity(sheet_names.len());
    for sheet in sheet_names {
        let range = workbook.worksheet_range(&sheet)?;
        let mut rows = range.rows();

        let Some(header_row) = rows.next() else {
            debug!(sheet = %sheet, "skipping empty sheet");
            continue;
        };

        let headers: Vec<String> = header_row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let header = cell.to_string().trim().to_string();
                if header.is_empty() {
                    format!("column_{}", i + 1)
                } else {
                    header
                }
            })
            .collect();

        let data: Vec<Vec<Value>> = rows
            .map(|row| row.iter().map(cell_value).collect())
            .collect();

        debug!(sheet = %sheet, rows = data.len(), columns = headers.len(), "read sheet");
        tables.push(RawTable::new(
            sheet.clone(),
            format!("{}:{}", file, sheet),
            headers,
            data,
        ));
    }

    let format = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| "xlsx".to_string());

    let metadata = SourceMetadata::new(
        path.to_path_buf(),
        source.hash,
        source.size_bytes,
        format,
        "binary",
    )
    .with_shape(&tables);

    Ok((tables, metadata))
}

/// Convert a spreadsheet cell to a value.
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) => Value::Decimal(*f),
        Data::Bool(b) => Value::text(b.to_string()),
        Data::String(s) => RawTable::text_cell(s),
        Data::DateTime(_) | Data::DateTimeIso(_) => {
            cell.as_datetime().map(Value::Date).unwrap_or(Value::Null)
        }
        Data::DurationIso(s) => Value::text(s.clone()),
    }
}
