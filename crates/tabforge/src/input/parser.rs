//! CSV/TSV parser with encoding fallback and delimiter detection.

use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, TabforgeError};
use crate::schema::Value;

use super::source::{RawTable, SourceMetadata, file_name, file_stem, read_source};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Parses delimited text files.
#[derive(Debug, Clone)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the raw table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(RawTable, SourceMetadata)> {
        let path = path.as_ref();
        let source = read_source(path)?;

        let (text, encoding) = decode(&source.contents);
        if encoding != "utf-8" {
            warn!(file = %path.display(), encoding, "file is not valid UTF-8, decoded with fallback");
        }

        // Detect delimiter if not specified
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(text.as_bytes())?,
        };
        debug!(delimiter = %(delimiter as char).escape_default(), "using delimiter");

        let table = self.parse_str(&text, delimiter, file_stem(path), file_name(path))?;

        // Determine format from delimiter
        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        };

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            source.hash,
            source.size_bytes,
            format,
            encoding,
        )
        .with_shape([&table]);

        Ok((table, metadata))
    }

    /// Parse decoded text directly.
    pub fn parse_str(
        &self,
        text: &str,
        delimiter: u8,
        name: impl Into<String>,
        origin: impl Into<String>,
    ) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut records = reader.records();

        let first = match records.next() {
            Some(record) => record?,
            None => return Err(TabforgeError::EmptyData("No data found".to_string())),
        };

        let mut rows = Vec::new();
        let headers: Vec<String> = if self.config.has_header {
            first.iter().map(|s| s.trim().to_string()).collect()
        } else {
            rows.push(first.iter().map(RawTable::text_cell).collect());
            (0..first.len()).map(|i| format!("column_{}", i + 1)).collect()
        };

        if headers.is_empty() {
            return Err(TabforgeError::EmptyData("No columns found".to_string()));
        }

        for result in records {
            if let Some(max) = self.config.max_rows {
                if rows.len() >= max {
                    break;
                }
            }

            let record = result?;
            let row: Vec<Value> = record.iter().map(RawTable::text_cell).collect();
            rows.push(row);
        }

        let headers = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| if h.is_empty() { format!("column_{}", i + 1) } else { h })
            .collect();

        Ok(RawTable::new(name, origin, headers, rows))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode file bytes as UTF-8, falling back to Windows-1252 (a superset of Latin-1).
fn decode(bytes: &[u8]) -> (String, &'static str) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.trim_start_matches('\u{feff}').to_string(), "utf-8"),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            (text.into_owned(), "windows-1252")
        }
    }
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .map_while(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(TabforgeError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let variance: f64 = if counts.len() > 1 {
            let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64
        } else {
            0.0
        };

        // Higher count with lower variance wins; tabs get a small bonus
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"a\tb\tc\n1\t2\t3\n4\t5\t6";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_detect_delimiter_semicolon_with_decimal_commas() {
        let data = "nome;valor\n\"Jo\u{e3}o\";\"1,5\"\nMaria;2".as_bytes();
        assert_eq!(detect_delimiter(data).unwrap(), b';');
    }

    #[test]
    fn test_parse_csv() {
        let parser = Parser::new();
        let data = "name,age,city\nAlice,30,NYC\nBob,NA,LA";
        let table = parser.parse_str(data, b',', "people", "people.csv").unwrap();

        assert_eq!(table.headers, vec!["name", "age", "city"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, 0), Some(&Value::text("Alice")));
        assert_eq!(table.get(1, 1), Some(&Value::Null));
    }

    #[test]
    fn test_parse_without_header() {
        let parser = Parser::with_config(ParserConfig {
            has_header: false,
            ..Default::default()
        });
        let table = parser.parse_str("1,2\n3,4", b',', "t", "t.csv").unwrap();

        assert_eq!(table.headers, vec!["column_1", "column_2"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let table = Parser::new().parse_str("a,b\n", b',', "t", "t.csv").unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(Parser::new().parse_str("", b',', "t", "t.csv").is_err());
    }

    #[test]
    fn test_decode_latin1_fallback() {
        let bytes = b"nome\nJos\xe9\n";
        let (text, encoding) = decode(bytes);
        assert_eq!(encoding, "windows-1252");
        assert!(text.contains("José"));
    }

    #[test]
    fn test_decode_strips_bom() {
        let (text, encoding) = decode("\u{feff}a,b".as_bytes());
        assert_eq!(encoding, "utf-8");
        assert_eq!(text, "a,b");
    }
}
