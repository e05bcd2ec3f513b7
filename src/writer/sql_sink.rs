//! INSERT statement output for a target dialect.

use super::{Sink, SqlDialect};
use crate::domain::TypeFamily;
use crate::record::{Records, Value};
use crate::schema::{Table, DEFAULT_SCHEMA};
use std::io::Write;

/// Rows per INSERT statement
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Writes tables as batched multi-row INSERT statements to one writer.
pub struct SqlSink<W: Write> {
    writer: W,
    dialect: SqlDialect,
    batch_size: usize,
    statements: usize,
}

impl<W: Write> SqlSink<W> {
    pub fn new(writer: W, dialect: SqlDialect) -> Self {
        Self {
            writer,
            dialect,
            batch_size: DEFAULT_BATCH_SIZE,
            statements: 0,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// INSERT statements written so far
    pub fn statements(&self) -> usize {
        self.statements
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn quote_identifier(&self, name: &str) -> String {
        match self.dialect {
            SqlDialect::MySql => format!("`{}`", name.replace('`', "``")),
            SqlDialect::Postgres | SqlDialect::Sqlite => {
                format!("\"{}\"", name.replace('"', "\"\""))
            }
            SqlDialect::Mssql => format!("[{}]", name.replace(']', "]]")),
        }
    }

    /// Schema-qualified for PostgreSQL; other dialects only qualify
    /// non-default schemas, and SQLite never does
    fn table_name(&self, table: &Table) -> String {
        let name = self.quote_identifier(&table.name.name);
        let qualify = match self.dialect {
            SqlDialect::Postgres => true,
            SqlDialect::Sqlite => false,
            SqlDialect::MySql | SqlDialect::Mssql => table.name.schema != DEFAULT_SCHEMA,
        };
        if qualify {
            format!("{}.{}", self.quote_identifier(&table.name.schema), name)
        } else {
            name
        }
    }

    /// Format a value as a SQL literal for a column of the given family
    fn format_value(&self, value: &Value, family: Option<TypeFamily>) -> String {
        let Some(value) = value else {
            return "NULL".to_string();
        };
        match family {
            Some(f) if f.is_numeric() && is_plain_number(value) => value.clone(),
            Some(TypeFamily::Boolean) => match parse_bool(value) {
                Some(b) => self.format_bool(b),
                None => self.format_sql_string(value),
            },
            Some(TypeFamily::Binary) => match value.strip_prefix("\\x") {
                Some(hex) => self.format_binary(value, hex),
                None => self.format_sql_string(value),
            },
            Some(TypeFamily::Bit) if self.dialect == SqlDialect::Postgres => {
                format!("B'{}'", value)
            }
            _ => self.format_sql_string(value),
        }
    }

    fn format_bool(&self, value: bool) -> String {
        match (self.dialect, value) {
            (SqlDialect::Postgres, true) => "TRUE".to_string(),
            (SqlDialect::Postgres, false) => "FALSE".to_string(),
            (_, true) => "1".to_string(),
            (_, false) => "0".to_string(),
        }
    }

    fn format_binary(&self, literal: &str, hex: &str) -> String {
        match self.dialect {
            SqlDialect::Postgres => self.format_sql_string(literal),
            SqlDialect::MySql | SqlDialect::Sqlite => format!("X'{}'", hex),
            SqlDialect::Mssql => format!("0x{}", hex),
        }
    }

    fn format_sql_string(&self, value: &str) -> String {
        match self.dialect {
            SqlDialect::MySql => {
                let escaped = value
                    .replace('\\', "\\\\")
                    .replace('\'', "''")
                    .replace('\n', "\\n")
                    .replace('\r', "\\r")
                    .replace('\t', "\\t")
                    .replace('\0', "\\0");
                format!("'{}'", escaped)
            }
            SqlDialect::Postgres | SqlDialect::Sqlite => {
                format!("'{}'", value.replace('\'', "''"))
            }
            SqlDialect::Mssql => {
                let escaped = value.replace('\'', "''");
                if value.bytes().any(|b| b > 127) {
                    format!("N'{}'", escaped)
                } else {
                    format!("'{}'", escaped)
                }
            }
        }
    }
}

impl<W: Write> Sink for SqlSink<W> {
    fn write_table(&mut self, table: &Table, records: &Records) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let families: Vec<Option<TypeFamily>> = records
            .columns()
            .iter()
            .map(|c| {
                table
                    .column(c.ordinal)
                    .and_then(|col| TypeFamily::classify(&col.col_type))
            })
            .collect();
        let header = format!(
            "INSERT INTO {} ({}) VALUES",
            self.table_name(table),
            records
                .columns()
                .iter()
                .map(|c| self.quote_identifier(&c.name))
                .collect::<Vec<_>>()
                .join(", ")
        );

        writeln!(
            self.writer,
            "-- {}: {} rows",
            table.name.canonical(),
            records.len()
        )?;
        for batch in records.rows().chunks(self.batch_size) {
            writeln!(self.writer, "{}", header)?;
            for (i, row) in batch.iter().enumerate() {
                let values: Vec<String> = records
                    .row_values(row)
                    .zip(&families)
                    .map(|(value, family)| self.format_value(value, *family))
                    .collect();
                let terminator = if i + 1 == batch.len() { ";" } else { "," };
                writeln!(self.writer, "({}){}", values.join(", "), terminator)?;
            }
            self.statements += 1;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Optional sign, digits, optional fraction
fn is_plain_number(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next();
    !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.is_none_or(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_plain_number() {
        assert!(is_plain_number("0"));
        assert!(is_plain_number("-12.50"));
        assert!(!is_plain_number("NaN"));
        assert!(!is_plain_number("1."));
        assert!(!is_plain_number("-"));
        assert!(!is_plain_number("1e5"));
    }

    #[test]
    fn test_string_escaping_per_dialect() {
        let pg = SqlSink::new(Vec::new(), SqlDialect::Postgres);
        assert_eq!(pg.format_sql_string("it's"), "'it''s'");
        let my = SqlSink::new(Vec::new(), SqlDialect::MySql);
        assert_eq!(my.format_sql_string("a\\b"), "'a\\\\b'");
        let ms = SqlSink::new(Vec::new(), SqlDialect::Mssql);
        assert_eq!(ms.format_sql_string("né"), "N'né'");
    }

    #[test]
    fn test_booleans() {
        let pg = SqlSink::new(Vec::new(), SqlDialect::Postgres);
        let lite = SqlSink::new(Vec::new(), SqlDialect::Sqlite);
        let value = Some("True".to_string());
        assert_eq!(pg.format_value(&value, Some(TypeFamily::Boolean)), "TRUE");
        assert_eq!(lite.format_value(&value, Some(TypeFamily::Boolean)), "1");
    }

    #[test]
    fn test_non_finite_numbers_are_quoted() {
        let pg = SqlSink::new(Vec::new(), SqlDialect::Postgres);
        assert_eq!(
            pg.format_value(&Some("Infinity".into()), Some(TypeFamily::Float)),
            "'Infinity'"
        );
        assert_eq!(pg.format_value(&None, Some(TypeFamily::Float)), "NULL");
    }
}
