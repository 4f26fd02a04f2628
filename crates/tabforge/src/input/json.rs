//! JSON reader for arrays of records and single records.

use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::error::{Result, TabforgeError};
use crate::schema::Value;

use super::source::{RawTable, SourceMetadata, file_name, file_stem, read_source};

/// Column name used when a JSON array holds scalars instead of objects.
const SCALAR_COLUMN: &str = "value";

/// Read a JSON file into a raw table.
pub fn read_json(path: impl AsRef<Path>) -> Result<(RawTable, SourceMetadata)> {
    let path = path.as_ref();
    let source = read_source(path)?;

    let text = std::str::from_utf8(&source.contents).map_err(|e| {
        TabforgeError::UnsupportedFormat(format!("JSON file is not valid UTF-8: {}", e))
    })?;
    let document: JsonValue = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;

    let table = table_from_json(document, file_stem(path), file_name(path))?;

    let metadata = SourceMetadata::new(
        path.to_path_buf(),
        source.hash,
        source.size_bytes,
        "json",
        "utf-8",
    )
    .with_shape([&table]);

    Ok((table, metadata))
}

/// Build a raw table from a parsed JSON document.
pub fn table_from_json(
    document: JsonValue,
    name: impl Into<String>,
    origin: impl Into<String>,
) -> Result<RawTable> {
    let records = match document {
        JsonValue::Array(items) => items,
        object @ JsonValue::Object(_) => vec![object],
        _ => {
            return Err(TabforgeError::UnsupportedFormat(
                "JSON document must be an object or an array".to_string(),
            ));
        }
    };

    // Union of keys in first-seen order
    let mut columns: IndexMap<String, usize> = IndexMap::new();
    for record in &records {
        match record {
            JsonValue::Object(map) => {
                for key in map.keys() {
                    let next = columns.len();
                    columns.entry(key.clone()).or_insert(next);
                }
            }
            _ => {
                let next = columns.len();
                columns.entry(SCALAR_COLUMN.to_string()).or_insert(next);
            }
        }
    }

    let width = columns.len();
    let rows = records
        .into_iter()
        .map(|record| {
            let mut row = vec![Value::Null; width];
            match record {
                JsonValue::Object(map) => {
                    for (key, value) in map {
                        if let Some(&index) = columns.get(&key) {
                            row[index] = json_value(value);
                        }
                    }
                }
                scalar => {
                    if let Some(&index) = columns.get(SCALAR_COLUMN) {
                        row[index] = json_value(scalar);
                    }
                }
            }
            row
        })
        .collect();

    Ok(RawTable::new(name, origin, columns.into_keys().collect(), rows))
}

/// Convert a JSON value to a cell value. Nested structures keep their JSON text.
fn json_value(value: JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::text(b.to_string()),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Decimal).unwrap_or(Value::Null),
        },
        JsonValue::String(s) => Value::Text(s),
        nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => Value::Text(nested.to_string()),
    }
}
