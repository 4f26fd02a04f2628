//! SQLite export and read-back.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{Connection, ToSql, params_from_iter};
use tracing::{debug, info, warn};

use super::{SqlDialect, ensure_parent};
use crate::error::{Result, TabforgeError};
use crate::schema::{Column, ColumnType, Table, Value};
use crate::session::RunMetadata;

/// Table holding the run metadata.
pub const METADATA_TABLE: &str = "_metadata";

/// Storage format for `TIMESTAMP` columns. Fractional seconds are written only
/// when present and are optional on read.
const STORED_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Decimal(d) => ToSqlOutput::Owned(SqlValue::Real(*d)),
            Value::Date(d) => {
                ToSqlOutput::Owned(SqlValue::Text(d.format(STORED_DATETIME_FORMAT).to_string()))
            }
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn declared_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Integer => "INTEGER",
        ColumnType::Decimal => "REAL",
        ColumnType::Date => "TIMESTAMP",
        ColumnType::Text => "TEXT",
    }
}

fn column_type(declared: &str) -> ColumnType {
    match declared.to_uppercase().as_str() {
        "INTEGER" => ColumnType::Integer,
        "REAL" => ColumnType::Decimal,
        "TIMESTAMP" => ColumnType::Date,
        _ => ColumnType::Text,
    }
}

fn quote(identifier: &str) -> String {
    SqlDialect::Sqlite.quote(identifier)
}

/// Write every table plus the run metadata to the database at `path`.
///
/// Existing tables with the same names are dropped and recreated. All writes
/// happen in a single transaction. Table names that collide case-insensitively
/// with an earlier table or with [`METADATA_TABLE`] get a `_n` suffix.
pub fn write_database(
    path: &Path,
    tables: &IndexMap<String, Table>,
    metadata: &RunMetadata,
) -> Result<()> {
    ensure_parent(path)?;
    let mut conn = Connection::open(path)?;
    let tx = conn.transaction()?;

    let names = table_names(tables.values());
    for (table, name) in tables.values().zip(&names) {
        if *name != table.name {
            warn!(table = %table.name, renamed = %name, "table name already taken in database");
        }
        write_table(&tx, name, table)?;
    }
    write_table(&tx, METADATA_TABLE, &metadata.to_table())?;

    tx.commit()?;
    info!(path = %path.display(), tables = tables.len(), "wrote SQLite database");
    Ok(())
}

/// SQLite compares table names ignoring ASCII case.
fn table_names<'a>(tables: impl IntoIterator<Item = &'a Table>) -> Vec<String> {
    let mut used = HashSet::from([METADATA_TABLE.to_ascii_lowercase()]);
    tables
        .into_iter()
        .map(|table| {
            let mut candidate = table.name.clone();
            let mut n = 1;
            while used.contains(&candidate.to_ascii_lowercase()) {
                candidate = format!("{}_{}", table.name, n);
                n += 1;
            }
            used.insert(candidate.to_ascii_lowercase());
            candidate
        })
        .collect()
}

fn write_table(conn: &Connection, name: &str, table: &Table) -> Result<()> {
    let name = quote(name);
    let definitions: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("{} {}", quote(&c.name), declared_type(c.column_type)))
        .collect();

    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {name};\nCREATE TABLE {name} ({});",
        definitions.join(", ")
    ))?;

    let placeholders = vec!["?"; table.column_count()].join(", ");
    let mut stmt = conn.prepare(&format!("INSERT INTO {name} VALUES ({placeholders})"))?;
    for row in table.rows() {
        stmt.execute(params_from_iter(row))?;
    }

    debug!(table = %table.name, rows = table.row_count(), "inserted rows");
    Ok(())
}

/// Names of the user tables in a database.
pub fn list_tables(path: &Path) -> Result<Vec<String>> {
    let conn = Connection::open(path)?;
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

/// Read a table back, mapping declared column types onto [`ColumnType`].
pub fn read_table(path: &Path, name: &str) -> Result<Table> {
    let conn = Connection::open(path)?;

    let mut info = conn.prepare(&format!("PRAGMA table_info({})", quote(name)))?;
    let schema = info
        .query_map([], |row| {
            Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if schema.is_empty() {
        return Err(TabforgeError::EmptyData(format!(
            "table '{}' not found in '{}'",
            name,
            path.display()
        )));
    }

    let types: Vec<ColumnType> = schema.iter().map(|(_, t)| column_type(t)).collect();
    let mut values: Vec<Vec<Value>> = vec![Vec::new(); schema.len()];

    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote(name)))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        for (i, column_type) in types.iter().enumerate() {
            values[i].push(read_value(row.get_ref(i)?, *column_type));
        }
    }

    let columns = schema
        .into_iter()
        .zip(types)
        .zip(values)
        .map(|(((column, _), column_type), values)| Column::new(column, column_type, values))
        .collect();

    Ok(Table::with_columns(name, columns))
}

fn read_value(value: ValueRef<'_>, column_type: ColumnType) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) if column_type == ColumnType::Decimal => Value::Decimal(i as f64),
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Decimal(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            if column_type == ColumnType::Date {
                if let Ok(date) = NaiveDateTime::parse_from_str(&text, STORED_DATETIME_FORMAT) {
                    return Value::Date(date);
                }
            }
            Value::text(text)
        }
    }
}
