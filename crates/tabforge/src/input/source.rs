//! Data source abstraction and metadata.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, TabforgeError};
use crate::schema::Value;

/// Tokens read as missing values in delimited and spreadsheet text cells.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Metadata about the source data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, xlsx, json, etc.).
    pub format: String,
    /// Text encoding the file was decoded with.
    pub encoding: String,
    /// Number of data rows across all tables read from the file.
    pub row_count: usize,
    /// Number of columns (widest table for workbooks).
    pub column_count: usize,
    /// When the file was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been read.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: impl Into<String>,
        encoding: impl Into<String>,
    ) -> Self {
        let file = file_name(&path);

        Self {
            file,
            path,
            hash,
            size_bytes,
            format: format.into(),
            encoding: encoding.into(),
            row_count: 0,
            column_count: 0,
            loaded_at: Utc::now(),
        }
    }

    /// Record the shape of the tables read from the file.
    pub fn with_shape<'a>(mut self, tables: impl IntoIterator<Item = &'a RawTable>) -> Self {
        for table in tables {
            self.row_count += table.row_count();
            self.column_count = self.column_count.max(table.column_count());
        }
        self
    }
}

/// Raw contents of a source file, read fully into memory.
pub(crate) struct SourceBytes {
    pub contents: Vec<u8>,
    pub size_bytes: u64,
    pub hash: String,
}

/// Read a whole file and hash it.
pub(crate) fn read_source(path: &Path) -> Result<SourceBytes> {
    let contents = fs::read(path).map_err(|e| TabforgeError::io(path, e))?;
    let size_bytes = contents.len() as u64;

    let mut hasher = Sha256::new();
    hasher.update(&contents);
    let hash = format!("sha256:{:x}", hasher.finalize());

    Ok(SourceBytes {
        contents,
        size_bytes,
        hash,
    })
}

/// File name component of a path, lossily converted.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File stem component of a path, lossily converted.
pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Tabular data as read from a source, before type detection.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Table name (file stem or sheet name).
    pub name: String,
    /// Value for the origin column of every row.
    pub origin: String,
    /// Column headers, made unique.
    pub headers: Vec<String>,
    /// Row data (row-major order). Every row has one value per header.
    pub rows: Vec<Vec<Value>>,
}

impl RawTable {
    /// Create a raw table. Duplicate headers get a numeric suffix and rows are
    /// padded with nulls or truncated to the header width.
    pub fn new(
        name: impl Into<String>,
        origin: impl Into<String>,
        headers: Vec<String>,
        mut rows: Vec<Vec<Value>>,
    ) -> Self {
        let headers = unique_headers(headers);
        let width = headers.len();
        for row in &mut rows {
            row.resize(width, Value::Null);
        }

        Self {
            name: name.into(),
            origin: origin.into(),
            headers,
            rows,
        }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Split into `(header, values)` pairs, one per column.
    pub fn into_columns(self) -> Vec<(String, Vec<Value>)> {
        let row_count = self.rows.len();
        let mut columns: Vec<Vec<Value>> = (0..self.headers.len())
            .map(|_| Vec::with_capacity(row_count))
            .collect();

        for row in self.rows {
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }

        self.headers.into_iter().zip(columns).collect()
    }

    /// Check if a text cell represents a missing/null value.
    pub fn is_null_value(value: &str) -> bool {
        NULL_TOKENS.contains(&value.trim())
    }

    /// Convert a text cell to a value, mapping null tokens to [`Value::Null`].
    pub fn text_cell(value: &str) -> Value {
        if Self::is_null_value(value) {
            Value::Null
        } else {
            Value::text(value)
        }
    }
}

/// Rename repeated headers as `name.1`, `name.2`, ... in order of appearance.
fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(headers.len());

    for header in headers {
        let mut candidate = header.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", header, n);
            n += 1;
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }

    result
}
