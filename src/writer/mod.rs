//! Sinks that persist generated rows.
//!
//! - [`CsvSink`]: one CSV file per table in an output directory
//! - [`SqlSink`]: batched INSERT statements for a target dialect

mod csv_sink;
mod sql_sink;

pub use csv_sink::CsvSink;
pub use sql_sink::{SqlSink, DEFAULT_BATCH_SIZE};

use crate::record::Records;
use crate::schema::Table;

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;

/// Receives generated tables in insertion order.
pub trait Sink {
    /// Write every row of one table
    fn write_table(&mut self, table: &Table, records: &Records) -> anyhow::Result<()>;

    /// Flush everything written so far
    fn finish(&mut self) -> anyhow::Result<()>;
}

/// Target SQL dialect for INSERT output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    MySql,
    #[default]
    Postgres,
    Sqlite,
    Mssql,
}

impl std::str::FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(SqlDialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(SqlDialect::Postgres),
            "sqlite" | "sqlite3" => Ok(SqlDialect::Sqlite),
            "mssql" | "sqlserver" | "sql_server" => Ok(SqlDialect::Mssql),
            _ => Err(format!(
                "Unknown dialect: {}. Valid options: mysql, postgres, sqlite, mssql",
                s
            )),
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlDialect::MySql => write!(f, "mysql"),
            SqlDialect::Postgres => write!(f, "postgres"),
            SqlDialect::Sqlite => write!(f, "sqlite"),
            SqlDialect::Mssql => write!(f, "mssql"),
        }
    }
}

/// Output format of the generate command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Sql,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "sql" => Ok(OutputFormat::Sql),
            _ => Err(format!("Unknown format: {}. Valid options: csv, sql", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Sql => write!(f, "sql"),
        }
    }
}
