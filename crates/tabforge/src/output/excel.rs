//! Excel workbook export.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::info;

use super::ensure_parent;
use crate::error::Result;
use crate::inference::QualityAnalyzer;
use crate::schema::{Table, Value};
use crate::session::RunMetadata;

/// Name of the quality summary sheet.
pub const QUALITY_SHEET: &str = "Quality_Analysis";
/// Name of the run metadata sheet.
pub const METADATA_SHEET: &str = "Metadata";

const MAX_SHEET_NAME: usize = 31;
const DATE_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

const QUALITY_HEADERS: &[&str] = &[
    "table",
    "column",
    "detected_type",
    "null_count",
    "unique_count",
    "completeness",
    "min",
    "max",
    "mean",
    "median",
    "min_date",
    "max_date",
];

/// Write every table to its own worksheet, followed by the optional quality
/// sheet and the metadata sheet.
pub fn write_workbook(
    path: &Path,
    tables: &IndexMap<String, Table>,
    metadata: &RunMetadata,
    include_quality: bool,
) -> Result<()> {
    ensure_parent(path)?;

    let header = Format::new().set_bold();
    let date = Format::new().set_num_format(DATE_NUM_FORMAT);
    let mut used = HashSet::new();
    let mut workbook = Workbook::new();

    for table in tables.values() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(&table.name, &mut used))?;
        write_table(worksheet, table, &header, &date)?;
    }

    if include_quality {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(QUALITY_SHEET, &mut used))?;
        write_quality(worksheet, tables, &header, &date)?;
    }

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(METADATA_SHEET, &mut used))?;
    write_metadata(worksheet, metadata, &header, &date)?;

    workbook.save(path)?;
    info!(path = %path.display(), tables = tables.len(), "wrote Excel workbook");
    Ok(())
}

/// Excel sheet names: at most 31 characters, no `[]:*?/\`, unique
/// case-insensitively.
fn sheet_name(name: &str, used: &mut HashSet<String>) -> String {
    let clean: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let clean = if clean.trim().is_empty() {
        "Sheet".to_string()
    } else {
        clean
    };

    let mut candidate: String = clean.chars().take(MAX_SHEET_NAME).collect();
    let mut n = 1;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!("_{}", n);
        let base: String = clean
            .chars()
            .take(MAX_SHEET_NAME - suffix.len())
            .collect();
        candidate = format!("{}{}", base, suffix);
        n += 1;
    }

    used.insert(candidate.to_lowercase());
    candidate
}

fn write_value(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    date: &Format,
) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Integer(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        Value::Decimal(d) => {
            worksheet.write_number(row, col, *d)?;
        }
        Value::Date(d) => {
            worksheet.write_datetime_with_format(row, col, d, date)?;
        }
        Value::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}

fn write_table(
    worksheet: &mut Worksheet,
    table: &Table,
    header: &Format,
    date: &Format,
) -> Result<()> {
    for (col, column) in table.columns.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, &column.name, header)?;
        for (row, value) in column.values.iter().enumerate() {
            write_value(worksheet, row as u32 + 1, col, value, date)?;
        }
    }
    Ok(())
}

fn write_quality(
    worksheet: &mut Worksheet,
    tables: &IndexMap<String, Table>,
    header: &Format,
    date: &Format,
) -> Result<()> {
    for (col, name) in QUALITY_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, header)?;
    }

    let analyzer = QualityAnalyzer::new();
    let mut row = 1u32;
    for table in tables.values() {
        let quality = analyzer.analyze_table(table);
        for (column, stats) in &quality.columns {
            let numeric = stats.numeric.as_ref();
            let dates = stats.dates.as_ref();
            let cells = [
                Value::text(quality.table.as_str()),
                Value::text(column.as_str()),
                Value::text(stats.detected_type.label()),
                Value::Integer(stats.null_count as i64),
                Value::Integer(stats.unique_count as i64),
                Value::Decimal(stats.completeness),
                numeric.and_then(|n| n.min).into(),
                numeric.and_then(|n| n.max).into(),
                numeric.and_then(|n| n.mean).into(),
                numeric.and_then(|n| n.median).into(),
                dates.and_then(|d| d.min_date.clone()).into(),
                dates.and_then(|d| d.max_date.clone()).into(),
            ];

            for (col, value) in cells.iter().enumerate() {
                write_value(worksheet, row, col as u16, value, date)?;
            }
            row += 1;
        }
    }
    Ok(())
}

fn write_metadata(
    worksheet: &mut Worksheet,
    metadata: &RunMetadata,
    header: &Format,
    date: &Format,
) -> Result<()> {
    worksheet.write_string_with_format(0, 0, "field", header)?;
    worksheet.write_string_with_format(0, 1, "value", header)?;

    let table = metadata.to_table();
    for (i, column) in table.columns.iter().enumerate() {
        let row = i as u32 + 1;
        worksheet.write_string(row, 0, &column.name)?;
        if let Some(value) = column.values.first() {
            write_value(worksheet, row, 1, value, date)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType};
    use calamine::{Data, Reader, open_workbook_auto};

    #[test]
    fn test_sheet_name() {
        let mut used = HashSet::new();
        assert_eq!(sheet_name("vendas", &mut used), "vendas");
        assert_eq!(sheet_name("VENDAS", &mut used), "VENDAS_1");
        assert_eq!(sheet_name("a/b:c", &mut used), "a_b_c");

        let long = "x".repeat(40);
        let first = sheet_name(&long, &mut used);
        let second = sheet_name(&long, &mut used);
        assert_eq!(first.chars().count(), 31);
        assert_eq!(second.chars().count(), 31);
        assert!(second.ends_with("_1"));
    }

    #[test]
    fn test_write_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dados.xlsx");
        let table = Table::with_columns(
            "clientes",
            vec![
                Column::new("nome", ColumnType::Text, vec!["Ana".into(), Value::Null]),
                Column::new(
                    "idade",
                    ColumnType::Integer,
                    vec![Value::Integer(30), Value::Integer(41)],
                ),
            ],
        );
        let tables = IndexMap::from([("clientes".to_string(), table)]);

        write_workbook(&path, &tables, &RunMetadata::default(), true).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(
            workbook.sheet_names().to_owned(),
            vec!["clientes", QUALITY_SHEET, METADATA_SHEET]
        );

        let range = workbook.worksheet_range("clientes").unwrap();
        assert_eq!(range.get_value((0, 1)), Some(&Data::String("idade".into())));
        assert_eq!(range.get_value((1, 0)), Some(&Data::String("Ana".into())));
        assert_eq!(range.get_value((2, 1)), Some(&Data::Float(41.0)));

        let quality = workbook.worksheet_range(QUALITY_SHEET).unwrap();
        assert_eq!(quality.height(), 3);
    }

    #[test]
    fn test_quality_sheet_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dados.xlsx");
        let tables = IndexMap::new();

        write_workbook(&path, &tables, &RunMetadata::default(), false).unwrap();

        let workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(workbook.sheet_names().to_owned(), vec![METADATA_SHEET]);
    }
}
