//! Error types for the tabforge library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tabforge operations.
#[derive(Debug, Error)]
pub enum TabforgeError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error opening or reading a spreadsheet.
    #[error("Excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// Error writing an Excel workbook.
    #[error("Workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// Error from the embedded SQLite store.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// File format or structure not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Empty file or no data to process.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// A file could not be loaded. Wraps the underlying failure with the file name.
    #[error("Failed to load {file}: {source}")]
    Load {
        file: String,
        #[source]
        source: Box<TabforgeError>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The background worker stopped without reporting a result.
    #[error("Worker error: {0}")]
    Worker(String),
}

impl TabforgeError {
    /// Wrap an error as a file-level load failure.
    pub fn load(file: impl Into<String>, source: TabforgeError) -> Self {
        TabforgeError::Load {
            file: file.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TabforgeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for tabforge operations.
pub type Result<T> = std::result::Result<T, TabforgeError>;
