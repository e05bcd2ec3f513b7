//! Unit tests for the CSV and SQL sinks.

use rowseed::record::{Record, Records};
use rowseed::schema::{ColumnId, ColumnType, Identifier, Table, TableId};
use rowseed::writer::{CsvSink, Sink, SqlDialect, SqlSink};
use tempfile::TempDir;

fn table(qualified: &str) -> Table {
    let mut table = Table::new(Identifier::parse(qualified), TableId(0));
    table.add_column("id", ColumnType::base("int4"));
    table.add_column("name", ColumnType::base("text"));
    table.add_column("active", ColumnType::base("bool"));
    table
}

fn records(table: &Table, rows: &[(&str, Option<&str>, &str)]) -> Records {
    let mut records = Records::new(table, &[ColumnId(0), ColumnId(1), ColumnId(2)]);
    for (id, name, active) in rows {
        records.push(Record::from_pairs(vec![
            (ColumnId(0), Some(id.to_string())),
            (ColumnId(1), name.map(|n| n.to_string())),
            (ColumnId(2), Some(active.to_string())),
        ]));
    }
    records
}

fn render(dialect: SqlDialect, table: &Table, records: &Records, batch: usize) -> String {
    let mut sink = SqlSink::new(Vec::new(), dialect).with_batch_size(batch);
    sink.write_table(table, records).unwrap();
    sink.finish().unwrap();
    String::from_utf8(sink.into_inner()).unwrap()
}

#[test]
fn test_csv_sink_writes_header_and_rows() {
    let dir = TempDir::new().unwrap();
    let users = table("public.users");
    let rows = records(&users, &[("1", Some("a,b"), "True"), ("-1", None, "False")]);

    let mut sink = CsvSink::new(dir.path().join("out"));
    sink.ensure_output_dir().unwrap();
    sink.write_table(&users, &rows).unwrap();
    sink.finish().unwrap();

    let path = dir.path().join("out").join("public.users.csv");
    assert_eq!(sink.files(), &[path.clone()]);
    let content = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, vec!["id,name,active", "1,\"a,b\",True", "-1,,False"]);
}

#[test]
fn test_sql_sink_postgres() {
    let users = table("public.users");
    let rows = records(&users, &[("1", Some("it's"), "True"), ("2", None, "False")]);
    let out = render(SqlDialect::Postgres, &users, &rows, 100);
    assert_eq!(
        out,
        "-- public.users: 2 rows\n\
         INSERT INTO \"public\".\"users\" (\"id\", \"name\", \"active\") VALUES\n\
         (1, 'it''s', TRUE),\n\
         (2, NULL, FALSE);\n\n"
    );
}

#[test]
fn test_sql_sink_batches() {
    let users = table("public.users");
    let rows = records(
        &users,
        &[("1", Some("a"), "True"), ("2", Some("b"), "True"), ("3", Some("c"), "True")],
    );
    let mut sink = SqlSink::new(Vec::new(), SqlDialect::MySql).with_batch_size(2);
    sink.write_table(&users, &rows).unwrap();
    assert_eq!(sink.statements(), 2);

    let out = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(out.matches("INSERT INTO `users`").count(), 2);
    assert!(out.contains("(2, 'b', 1);\n"));
    assert!(out.contains("(3, 'c', 1);\n"));
}

#[test]
fn test_sql_sink_qualification_per_dialect() {
    let items = table("shop.items");
    let rows = records(&items, &[("1", Some("x"), "False")]);

    assert!(render(SqlDialect::MySql, &items, &rows, 10).contains("INSERT INTO `shop`.`items`"));
    assert!(render(SqlDialect::Mssql, &items, &rows, 10).contains("INSERT INTO [shop].[items]"));
    assert!(render(SqlDialect::Sqlite, &items, &rows, 10).contains("INSERT INTO \"items\""));
}

#[test]
fn test_sql_sink_skips_empty_tables() {
    let users = table("public.users");
    let rows = records(&users, &[]);
    assert_eq!(render(SqlDialect::Postgres, &users, &rows, 10), "");
}
