//! Tabforge: type inference and normalization for heterogeneous tabular files.
//!
//! Tabforge loads CSV, Excel and JSON files into typed tables, deciding a type
//! for every column from its values, then exports the result to Excel, SQLite
//! or a SQL DDL script.
//!
//! # Pipeline
//!
//! Every loaded table goes through the same steps:
//!
//! - **Type detection**: each column becomes `date`, `integer`, `decimal` or
//!   `text`; values that do not fit the chosen type become null
//! - **Origin tagging**: a `source_file` column records where each row came from
//! - **Normalization**: diacritics are stripped from text columns
//! - **Deduplication**: repeated rows are removed, keeping the first
//!
//! # Example
//!
//! ```no_run
//! use tabforge::Session;
//!
//! let mut session = Session::new();
//! session.begin_run();
//! for table in session.load_file("clientes.csv").unwrap() {
//!     println!("loaded {}", table);
//! }
//! session.finish_run();
//!
//! for quality in session.analyze_quality() {
//!     println!("{}: {} records", quality.table, quality.total_records);
//! }
//! ```

pub mod batch;
pub mod error;
pub mod inference;
pub mod input;
pub mod output;
pub mod schema;
pub mod transform;

mod session;

pub use batch::{BatchEvent, BatchOutcome, BatchWorker, CancelToken};
pub use error::{Result, TabforgeError};
pub use inference::{InferenceConfig, analyze_quality, infer_column_type, normalize_text};
pub use input::{ParserConfig, RawTable, SourceKind, SourceMetadata};
pub use output::SqlDialect;
pub use schema::{Column, ColumnQuality, ColumnType, Table, TableQuality, Value};
pub use session::{RunMetadata, Session, SessionConfig};
pub use transform::drop_duplicates;
