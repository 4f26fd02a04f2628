//! Process command - load files in a background batch and export the result.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use tabforge::{
    BatchEvent, BatchWorker, ColumnType, RunMetadata, Session, SessionConfig, TableQuality,
};

use crate::cli::ProcessArgs;

/// JSON document written by `--summary`.
#[derive(Serialize)]
struct Summary<'a> {
    metadata: &'a RunMetadata,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    quality: Vec<TableQuality>,
}

pub fn run(args: ProcessArgs, verbose: u8) -> Result<(), Box<dyn std::error::Error>> {
    for file in &args.files {
        if !file.exists() {
            return Err(format!("File not found: {}", file.display()).into());
        }
    }

    let mut config = SessionConfig::default()
        .with_normalization(!args.no_normalize)
        .with_deduplication(!args.no_dedup);
    if let Some(d) = args.delimiter {
        let byte = u8::try_from(d)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| format!("Delimiter must be a single ASCII character, got '{}'", d))?;
        config = config.with_delimiter(byte);
    }

    println!(
        "{} {} file(s)",
        "Processing".cyan().bold(),
        args.files.len().to_string().white().bold()
    );

    let worker = BatchWorker::spawn(args.files.clone(), config)?;
    let cancel = worker.cancel_token();
    ctrlc::set_handler(move || cancel.cancel())?;

    let session = collect_session(&worker)?;
    print_tables(&session, verbose);

    let metadata = session.metadata();
    println!();
    println!(
        "{} records in {} table(s), {} duplicate(s) removed",
        metadata.total_records.to_string().white().bold(),
        session.tables().len().to_string().white().bold(),
        metadata.duplicates_removed.to_string().yellow()
    );

    let mut exported = false;

    if let Some(path) = &args.excel {
        session.export_excel(path, !args.no_quality)?;
        saved(path);
        exported = true;
    }

    if let Some(path) = &args.sqlite {
        session.export_sqlite(path)?;
        saved(path);
        exported = true;
    }

    if let Some(path) = &args.sql {
        session.export_sql_script(path, args.dialect)?;
        saved(path);
        exported = true;
    }

    if let Some(path) = &args.summary {
        let quality = if args.no_quality {
            Vec::new()
        } else {
            session.analyze_quality()
        };
        let summary = Summary { metadata, quality };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &summary)?;
        saved(path);
        exported = true;
    }

    if !exported {
        println!();
        println!(
            "Nothing exported. Use {}, {} or {} to write results",
            "--excel".cyan(),
            "--sqlite".cyan(),
            "--sql".cyan()
        );
    }

    Ok(())
}

/// Drain worker events, printing progress, until the batch ends.
fn collect_session(worker: &BatchWorker) -> Result<Session, Box<dyn std::error::Error>> {
    for event in worker.events().iter() {
        match event {
            BatchEvent::Progress { percent, message } => {
                println!("  {} {}", format!("[{:>3}%]", percent).dimmed(), message);
            }
            BatchEvent::Completed(outcome) => return Ok(outcome.session),
            BatchEvent::Failed(message) => return Err(message.into()),
            BatchEvent::Cancelled => return Err("Processing cancelled".into()),
        }
    }
    Err("Worker stopped without a result".into())
}

fn print_tables(session: &Session, verbose: u8) {
    println!();
    println!("{}", "Tables:".yellow().bold());
    for table in session.tables().values() {
        println!(
            "  {:24} {:>8} rows {:>4} columns",
            table.name,
            table.row_count(),
            table.column_count()
        );

        if verbose > 0 {
            for column in &table.columns {
                println!("    {:22} {}", column.name, type_label(column.column_type));
            }
        }
    }
}

pub(crate) fn type_label(column_type: ColumnType) -> colored::ColoredString {
    let label = column_type.label();
    match column_type {
        ColumnType::Date => label.blue(),
        ColumnType::Integer | ColumnType::Decimal => label.green(),
        ColumnType::Text => label.normal(),
    }
}

fn saved(path: &Path) {
    println!(
        "{} {}",
        "Saved to".green().bold(),
        path.display().to_string().white()
    );
}
