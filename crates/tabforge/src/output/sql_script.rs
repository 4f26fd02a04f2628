//! DDL script generation.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::info;

use super::{SqlDialect, ensure_parent};
use crate::error::{Result, TabforgeError};
use crate::schema::{ColumnType, Table};

fn sql_type(column_type: ColumnType, dialect: SqlDialect) -> &'static str {
    match column_type {
        ColumnType::Integer => "INTEGER",
        ColumnType::Decimal => "DECIMAL(10,2)",
        ColumnType::Date => match dialect {
            SqlDialect::MySql => "DATETIME",
            SqlDialect::Postgres | SqlDialect::Sqlite => "TIMESTAMP",
        },
        ColumnType::Text => "VARCHAR(255)",
    }
}

/// Render `DROP`/`CREATE` statements for every table.
pub fn render_script(
    tables: &IndexMap<String, Table>,
    dialect: SqlDialect,
    generated_at: DateTime<Utc>,
) -> String {
    let mut script = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(script, "-- SQL script generated by tabforge");
    let _ = writeln!(
        script,
        "-- Generated at: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(script, "-- Dialect: {}", dialect);
    let _ = writeln!(script);

    for table in tables.values() {
        let name = dialect.quote(&table.name);
        let _ = writeln!(script, "DROP TABLE IF EXISTS {};", name);
        let _ = writeln!(script, "CREATE TABLE {} (", name);

        let definitions: Vec<String> = table
            .columns
            .iter()
            .map(|c| {
                format!(
                    "    {} {}",
                    dialect.quote(&c.name),
                    sql_type(c.column_type, dialect)
                )
            })
            .collect();
        let _ = writeln!(script, "{}", definitions.join(",\n"));
        let _ = writeln!(script, ");");
        let _ = writeln!(script);
    }

    script
}

/// Write the DDL script for every table to `path`.
pub fn write_script(
    path: &Path,
    tables: &IndexMap<String, Table>,
    dialect: SqlDialect,
) -> Result<()> {
    ensure_parent(path)?;
    let script = render_script(tables, dialect, Utc::now());
    fs::write(path, script).map_err(|e| TabforgeError::io(path, e))?;

    info!(path = %path.display(), %dialect, tables = tables.len(), "wrote SQL script");
    Ok(())
}
