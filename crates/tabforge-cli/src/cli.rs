//! CLI argument definitions using clap.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use tabforge::SqlDialect;

use crate::logging::LogFormat;

/// Tabforge: type detection, normalization and export for tabular files
#[derive(Parser)]
#[command(name = "tabforge")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load files, detect types, clean them and export the result
    Process(ProcessArgs),

    /// Show detected column types and quality statistics for one file
    Analyze {
        /// Path to the data file (CSV/TSV, Excel or JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Keep diacritics in text columns
        #[arg(long)]
        no_normalize: bool,
    },
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Data files to process, in order
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,

    /// Keep diacritics in text columns
    #[arg(long)]
    pub no_normalize: bool,

    /// Keep duplicate rows
    #[arg(long)]
    pub no_dedup: bool,

    /// Export every table to an Excel workbook
    #[arg(long, value_name = "PATH")]
    pub excel: Option<PathBuf>,

    /// Export every table to an SQLite database
    #[arg(long, value_name = "PATH")]
    pub sqlite: Option<PathBuf>,

    /// Write a CREATE TABLE script
    #[arg(long, value_name = "PATH")]
    pub sql: Option<PathBuf>,

    /// SQL dialect for --sql (mysql, postgres, sqlite)
    #[arg(long, default_value = "mysql", value_parser = parse_dialect)]
    pub dialect: SqlDialect,

    /// Leave the quality sheet out of the Excel export and the summary
    #[arg(long)]
    pub no_quality: bool,

    /// Write run metadata and quality statistics as JSON
    #[arg(long, value_name = "PATH")]
    pub summary: Option<PathBuf>,

    /// Field delimiter for delimited files (auto-detected by default)
    #[arg(short, long)]
    pub delimiter: Option<char>,
}

fn parse_dialect(s: &str) -> Result<SqlDialect, String> {
    s.parse().map_err(|e: tabforge::TabforgeError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_process_args() {
        let cli = Cli::try_parse_from([
            "tabforge",
            "-vv",
            "process",
            "a.csv",
            "b.xlsx",
            "--sql",
            "out.sql",
            "--dialect",
            "postgres",
            "--no-dedup",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Process(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.dialect, SqlDialect::Postgres);
                assert!(args.no_dedup);
                assert!(!args.no_normalize);
            }
            _ => panic!("expected process"),
        }
    }

    #[test]
    fn test_unknown_dialect_is_rejected() {
        let result = Cli::try_parse_from(["tabforge", "process", "a.csv", "--dialect", "oracle"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_process_requires_files() {
        assert!(Cli::try_parse_from(["tabforge", "process"]).is_err());
    }
}
