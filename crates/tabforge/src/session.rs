//! Processing session: loaded tables, run metadata and exports.

use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, TabforgeError};
use crate::inference::{InferenceConfig, QualityAnalyzer, TypeDetector, normalize_column};
use crate::input::{
    Parser, ParserConfig, RawTable, SourceKind, SourceMetadata, file_name, read_json,
    read_workbook,
};
use crate::output::{self, SqlDialect};
use crate::schema::{Column, ColumnType, ORIGIN_COLUMN, Table, TableQuality, Value};
use crate::transform::drop_duplicates;

/// Configuration for a processing session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Parser configuration for delimited files.
    pub parser: ParserConfig,
    /// Type detection thresholds.
    pub inference: InferenceConfig,
    /// Strip diacritics from text columns.
    pub normalize_text: bool,
    /// Remove duplicate rows from each table.
    pub deduplicate: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            inference: InferenceConfig::default(),
            normalize_text: true,
            deduplicate: true,
        }
    }
}

impl SessionConfig {
    /// Enable or disable text normalization.
    pub fn with_normalization(mut self, enable: bool) -> Self {
        self.normalize_text = enable;
        self
    }

    /// Enable or disable duplicate removal.
    pub fn with_deduplication(mut self, enable: bool) -> Self {
        self.deduplicate = enable;
        self
    }

    /// Use a fixed delimiter instead of auto-detection.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.parser.delimiter = Some(delimiter);
        self
    }

    /// Override the type detection thresholds.
    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }
}

/// Counters describing one processing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// When the run started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the run finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Names of the files loaded, in load order.
    pub files_processed: Vec<String>,
    /// Rows across all tables, computed when the run finishes.
    pub total_records: usize,
    /// Columns across all tables, computed when the run finishes.
    pub total_columns: usize,
    /// Duplicate rows removed across all tables.
    pub duplicates_removed: usize,
    /// Details of every file loaded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceMetadata>,
}

impl RunMetadata {
    /// One-row table view used by the exporters.
    pub fn to_table(&self) -> Table {
        let timestamp = |t: &Option<DateTime<Utc>>| {
            t.map(|t| Value::Date(t.naive_utc())).unwrap_or(Value::Null)
        };
        let count = |n: usize| Value::Integer(n as i64);

        Table::with_columns(
            output::METADATA_TABLE,
            vec![
                Column::new("started_at", ColumnType::Date, vec![timestamp(&self.started_at)]),
                Column::new("finished_at", ColumnType::Date, vec![timestamp(&self.finished_at)]),
                Column::new(
                    "files_processed",
                    ColumnType::Text,
                    vec![Value::text(self.files_processed.join("; "))],
                ),
                Column::new("total_records", ColumnType::Integer, vec![count(self.total_records)]),
                Column::new("total_columns", ColumnType::Integer, vec![count(self.total_columns)]),
                Column::new(
                    "duplicates_removed",
                    ColumnType::Integer,
                    vec![count(self.duplicates_removed)],
                ),
            ],
        )
    }
}

/// An in-memory processing session.
///
/// Holds the tables produced by the loaders and the metadata of the current
/// run. Loading a table with an existing name replaces it.
///
/// # Example
///
/// ```no_run
/// use tabforge::{Session, SqlDialect};
///
/// let mut session = Session::new();
/// session.begin_run();
/// session.load_file("clientes.csv")?;
/// session.load_file("vendas.xlsx")?;
/// let metadata = session.finish_run();
/// println!("{} duplicates removed", metadata.duplicates_removed);
///
/// session.export_sqlite("etl.db")?;
/// session.export_sql_script("schema.sql", SqlDialect::MySql)?;
/// # Ok::<(), tabforge::TabforgeError>(())
/// ```
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    parser: Parser,
    detector: TypeDetector,
    tables: IndexMap<String, Table>,
    metadata: RunMetadata,
}

impl Session {
    /// Create a session with default configuration.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create a session with custom configuration.
    pub fn with_config(config: SessionConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        let detector = TypeDetector::with_config(config.inference);

        Self {
            config,
            parser,
            detector,
            tables: IndexMap::new(),
            metadata: RunMetadata::default(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Tables loaded so far, in load order.
    pub fn tables(&self) -> &IndexMap<String, Table> {
        &self.tables
    }

    /// Get a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    /// Discard previous results and start a new run.
    pub fn begin_run(&mut self) {
        self.tables.clear();
        self.metadata = RunMetadata {
            started_at: Some(Utc::now()),
            ..Default::default()
        };
    }

    /// Compute run totals and stamp the finish time.
    pub fn finish_run(&mut self) -> &RunMetadata {
        self.metadata.total_records = self.tables.values().map(Table::row_count).sum();
        self.metadata.total_columns = self.tables.values().map(Table::column_count).sum();
        self.metadata.finished_at = Some(Utc::now());

        info!(
            files = self.metadata.files_processed.len(),
            records = self.metadata.total_records,
            duplicates_removed = self.metadata.duplicates_removed,
            "run finished"
        );
        &self.metadata
    }

    /// Load any supported file, chosen by extension. Returns the names of the
    /// tables it produced.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        match SourceKind::from_path(path) {
            Some(SourceKind::Delimited) => self.load_csv(path).map(|name| vec![name]),
            Some(SourceKind::Spreadsheet) => self.load_excel(path),
            Some(SourceKind::Json) => self.load_json(path).map(|name| vec![name]),
            None => Err(TabforgeError::load(
                file_name(path),
                TabforgeError::UnsupportedFormat(format!(
                    "unrecognized extension for '{}'",
                    path.display()
                )),
            )),
        }
    }

    /// Load a delimited text file as one table named after the file stem.
    pub fn load_csv(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let (raw, source) = self
            .parser
            .parse_file(path)
            .map_err(|e| TabforgeError::load(file_name(path), e))?;

        let name = self.store(raw);
        self.record_source(source);
        Ok(name)
    }

    /// Load every non-empty sheet of a workbook as a table named after the sheet.
    pub fn load_excel(&mut self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let (sheets, source) =
            read_workbook(path).map_err(|e| TabforgeError::load(file_name(path), e))?;

        let names = sheets.into_iter().map(|raw| self.store(raw)).collect();
        self.record_source(source);
        Ok(names)
    }

    /// Load a JSON file as one table named after the file stem.
    pub fn load_json(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let (raw, source) = read_json(path).map_err(|e| TabforgeError::load(file_name(path), e))?;

        let name = self.store(raw);
        self.record_source(source);
        Ok(name)
    }

    /// Run type detection, origin tagging, normalization and deduplication on a
    /// raw table. The removed-duplicate count is added to the run metadata.
    pub fn process_raw(&mut self, raw: RawTable) -> Table {
        let name = raw.name.clone();
        let origin = raw.origin.clone();
        let row_count = raw.row_count();

        let mut columns: Vec<Column> = raw
            .into_columns()
            .into_iter()
            .filter(|(header, _)| header != ORIGIN_COLUMN)
            .map(|(header, values)| {
                let (converted, column_type) = self.detector.infer(values);
                debug!(table = %name, column = %header, %column_type, "detected column type");
                Column::new(header, column_type, converted)
            })
            .collect();

        if self.config.normalize_text {
            for column in &mut columns {
                normalize_column(column);
            }
        }

        columns.push(Column::new(
            ORIGIN_COLUMN,
            ColumnType::Text,
            vec![Value::text(origin); row_count],
        ));

        let mut table = Table::with_columns(name, columns);

        if self.config.deduplicate {
            let removed = drop_duplicates(&mut table);
            if removed > 0 {
                debug!(table = %table.name, removed, "dropped duplicate rows");
            }
            self.metadata.duplicates_removed += removed;
        }

        table
    }

    /// Insert an already processed table, replacing any table with the same name.
    pub fn insert_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    fn store(&mut self, raw: RawTable) -> String {
        let table = self.process_raw(raw);
        let name = table.name.clone();
        info!(
            table = %name,
            rows = table.row_count(),
            columns = table.column_count(),
            "loaded table"
        );
        self.insert_table(table);
        name
    }

    fn record_source(&mut self, source: SourceMetadata) {
        self.metadata.files_processed.push(source.file.clone());
        self.metadata.sources.push(source);
    }

    /// Quality summary of every loaded table.
    pub fn analyze_quality(&self) -> Vec<TableQuality> {
        let analyzer = QualityAnalyzer::new();
        self.tables
            .values()
            .map(|t| analyzer.analyze_table(t))
            .collect()
    }

    /// Write every table to an Excel workbook.
    pub fn export_excel(&self, path: impl AsRef<Path>, include_quality: bool) -> Result<()> {
        output::write_workbook(path.as_ref(), &self.tables, &self.metadata, include_quality)
    }

    /// Write every table to an SQLite database, replacing existing tables.
    pub fn export_sqlite(&self, path: impl AsRef<Path>) -> Result<()> {
        output::write_database(path.as_ref(), &self.tables, &self.metadata)
    }

    /// Write a DDL script creating every table.
    pub fn export_sql_script(&self, path: impl AsRef<Path>, dialect: SqlDialect) -> Result<()> {
        output::write_script(path.as_ref(), &self.tables, dialect)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[[&str; 2]]) -> RawTable {
        RawTable::new(
            "clientes",
            "clientes.csv",
            vec!["nome".into(), "idade".into()],
            rows.iter()
                .map(|r| r.iter().map(|s| RawTable::text_cell(s)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_process_raw_pipeline() {
        let mut session = Session::new();
        session.begin_run();

        let table = session.process_raw(raw(&[
            ["José", "30"],
            ["Jose", "30"],
            ["Ana", "NA"],
        ]));

        assert_eq!(table.column_names(), vec!["nome", "idade", ORIGIN_COLUMN]);
        assert_eq!(table.columns[1].column_type, ColumnType::Integer);
        // "José" normalizes to "Jose" and collapses with the next row
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(1, 1), Some(&Value::Null));
        assert_eq!(table.get(0, 2), Some(&Value::from("clientes.csv")));
        assert_eq!(session.metadata().duplicates_removed, 1);
    }

    #[test]
    fn test_process_raw_without_normalization() {
        let config = SessionConfig::default().with_normalization(false);
        let mut session = Session::with_config(config);

        let table = session.process_raw(raw(&[["José", "30"], ["Jose", "30"]]));
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, 0), Some(&Value::from("José")));
    }

    #[test]
    fn test_process_raw_without_dedup() {
        let config = SessionConfig::default().with_deduplication(false);
        let mut session = Session::with_config(config);

        let table = session.process_raw(raw(&[["a", "1"], ["a", "1"]]));
        assert_eq!(table.row_count(), 2);
        assert_eq!(session.metadata().duplicates_removed, 0);
    }

    #[test]
    fn test_origin_column_is_not_duplicated() {
        let mut session = Session::new();
        let raw = RawTable::new(
            "t",
            "t.csv",
            vec!["a".into(), ORIGIN_COLUMN.into()],
            vec![vec!["x".into(), "old".into()]],
        );
        let table = session.process_raw(raw);

        assert_eq!(table.column_names(), vec!["a", ORIGIN_COLUMN]);
        assert_eq!(table.get(0, 1), Some(&Value::from("t.csv")));
    }

    #[test]
    fn test_begin_run_resets_state() {
        let mut session = Session::new();
        session.begin_run();
        let table = session.process_raw(raw(&[["a", "1"], ["a", "1"]]));
        session.insert_table(table);
        session.finish_run();
        assert_eq!(session.metadata().total_records, 1);
        assert_eq!(session.metadata().total_columns, 3);

        session.begin_run();
        assert!(session.tables().is_empty());
        assert_eq!(session.metadata().duplicates_removed, 0);
        assert!(session.metadata().started_at.is_some());
        assert!(session.metadata().finished_at.is_none());
    }

    #[test]
    fn test_unsupported_extension() {
        let mut session = Session::new();
        let err = session.load_file("song.mp3").unwrap_err();
        assert!(matches!(err, TabforgeError::Load { .. }));
        assert!(err.to_string().contains("song.mp3"));
    }

    #[test]
    fn test_metadata_table() {
        let metadata = RunMetadata {
            files_processed: vec!["a.csv".into(), "b.json".into()],
            duplicates_removed: 2,
            ..Default::default()
        };
        let table = metadata.to_table();

        assert_eq!(table.row_count(), 1);
        assert_eq!(table.get(0, 0), Some(&Value::Null));
        assert_eq!(table.get(0, 2), Some(&Value::from("a.csv; b.json")));
        assert_eq!(
            table.get_column("duplicates_removed").unwrap().values,
            vec![Value::Integer(2)]
        );
    }
}
