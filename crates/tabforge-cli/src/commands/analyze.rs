//! Analyze command - print detected types and quality statistics for one file.

use std::path::PathBuf;

use colored::Colorize;
use tabforge::{Session, SessionConfig};

use super::process::type_label;

pub fn run(
    file: PathBuf,
    json: bool,
    no_normalize: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let config = SessionConfig::default().with_normalization(!no_normalize);
    let mut session = Session::with_config(config);
    session.begin_run();
    session.load_file(&file)?;
    let duplicates = session.finish_run().duplicates_removed;

    let quality = session.analyze_quality();

    if json {
        println!("{}", serde_json::to_string_pretty(&quality)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Analyzed".cyan().bold(),
        file.display().to_string().white()
    );

    for table in &quality {
        println!();
        println!(
            "{} ({} records, {} columns)",
            table.table.yellow().bold(),
            table.total_records,
            table.total_columns
        );

        for (name, column) in &table.columns {
            println!(
                "  {:24} {:8} {:>7.2}% complete {:>8} unique",
                name,
                type_label(column.detected_type),
                column.completeness,
                column.unique_count
            );

            if let Some(numeric) = &column.numeric {
                if let (Some(min), Some(max), Some(mean), Some(median)) =
                    (numeric.min, numeric.max, numeric.mean, numeric.median)
                {
                    println!(
                        "    {}",
                        format!("min {} max {} mean {:.2} median {}", min, max, mean, median)
                            .dimmed()
                    );
                }
            }

            if let Some(dates) = &column.dates {
                if let (Some(first), Some(last)) = (&dates.min_date, &dates.max_date) {
                    println!("    {}", format!("from {} to {}", first, last).dimmed());
                }
            }
        }
    }

    if duplicates > 0 {
        println!();
        println!(
            "{} duplicate row(s) removed",
            duplicates.to_string().yellow()
        );
    }

    Ok(())
}
