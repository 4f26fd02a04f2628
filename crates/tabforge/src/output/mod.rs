//! Export writers: Excel workbooks, SQLite databases and SQL DDL scripts.

mod excel;
mod sql_script;
mod sqlite;

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, TabforgeError};

pub use excel::{METADATA_SHEET, QUALITY_SHEET, write_workbook};
pub use sql_script::{render_script, write_script};
pub use sqlite::{METADATA_TABLE, list_tables, read_table, write_database};

/// SQL dialect for generated DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    #[default]
    MySql,
    Postgres,
    Sqlite,
}

impl SqlDialect {
    /// Quote an identifier for this dialect.
    pub fn quote(&self, identifier: &str) -> String {
        match self {
            SqlDialect::MySql => format!("`{}`", identifier.replace('`', "``")),
            SqlDialect::Postgres | SqlDialect::Sqlite => {
                format!("\"{}\"", identifier.replace('"', "\"\""))
            }
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SqlDialect::MySql => "mysql",
            SqlDialect::Postgres => "postgres",
            SqlDialect::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

impl FromStr for SqlDialect {
    type Err = TabforgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mysql" => Ok(SqlDialect::MySql),
            "postgres" | "postgresql" => Ok(SqlDialect::Postgres),
            "sqlite" => Ok(SqlDialect::Sqlite),
            other => Err(TabforgeError::Config(format!(
                "unknown SQL dialect '{}' (expected mysql, postgres or sqlite)",
                other
            ))),
        }
    }
}

/// Create the parent directory of an output path if it does not exist.
fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| TabforgeError::io(parent, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_parse() {
        assert_eq!("MySQL".parse::<SqlDialect>().unwrap(), SqlDialect::MySql);
        assert_eq!("postgresql".parse::<SqlDialect>().unwrap(), SqlDialect::Postgres);
        assert_eq!("sqlite".parse::<SqlDialect>().unwrap(), SqlDialect::Sqlite);
        assert!("oracle".parse::<SqlDialect>().is_err());
    }

    #[test]
    fn test_quote() {
        assert_eq!(SqlDialect::MySql.quote("data venda"), "`data venda`");
        assert_eq!(SqlDialect::Postgres.quote("a\"b"), "\"a\"\"b\"");
    }
}
