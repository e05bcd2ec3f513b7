//! Unit tests for YAML generation config applied to a schema.

use rowseed::domain::RhaiHost;
use rowseed::generator::{GenerateOptions, GenerateYamlConfig, GenerationWarning, Generator};
use rowseed::record::Value;
use rowseed::schema::{load_schema, Schema};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SCHEMA: &str = r#"
CREATE TABLE users (
    id INT PRIMARY KEY,
    email VARCHAR(20) NOT NULL UNIQUE,
    status TEXT,
    score NUMERIC(4, 1)
);
CREATE TABLE orders (id INT PRIMARY KEY, user_id INT REFERENCES users(id));
"#;

const EMAIL_SCRIPT: &str = r#"
fn reset(column) { this.i = 0; }
fn next() { this.i += 1; this.i <= 100 }
fn value() { `user${this.i}@example.com` }
"#;

fn setup(config: &str, scripts: &[(&str, &str)]) -> (TempDir, Schema, GenerateYamlConfig) {
    let dir = TempDir::new().unwrap();
    let schema_path = dir.path().join("schema.sql");
    fs::write(&schema_path, SCHEMA).unwrap();
    for (name, source) in scripts {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, source).unwrap();
    }
    let config_path = dir.path().join("rowseed.yaml");
    fs::write(&config_path, config).unwrap();

    let schema = load_schema(&schema_path).unwrap();
    let config = GenerateYamlConfig::load(&config_path).unwrap();
    (dir, schema, config)
}

fn options(config: &GenerateYamlConfig) -> GenerateOptions {
    let mut options = GenerateOptions::default();
    config.apply_options(&mut options).unwrap();
    options
}

fn column(records: &rowseed::record::Records, name: &str) -> Vec<Value> {
    let pos = records
        .columns()
        .iter()
        .position(|c| c.name == name)
        .unwrap();
    records
        .rows()
        .iter()
        .map(|row| records.row_values(row).nth(pos).unwrap().clone())
        .collect()
}

fn some(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Some(v.to_string())).collect()
}

#[test]
fn test_config_domains_checks_and_warnings() {
    let config = r#"
seed: 5
default_checks: false
anchor: "2024-01-01T00:00:00Z"
tables:
  users:
    max_rows: 4
    columns:
      id: { domain: integer, top: 100 }
      email: { domain: script, path: scripts/email.rhai }
      status: { domain: enum, values: [active, banned] }
    checks:
      - { id: 42, status: null }
  ghosts:
    skip: true
  orders:
    columns:
      nope: { domain: unique }
"#;
    let (dir, schema, config) = setup(config, &[("scripts/email.rhai", EMAIL_SCRIPT)]);
    let mut generator = Generator::new(&schema, options(&config));
    config
        .apply(&mut generator, &RhaiHost::new(), dir.path())
        .unwrap();
    let report = generator.run().unwrap();

    let users = &report.table("public.users").unwrap().records;
    assert_eq!(users.len(), 4);
    assert_eq!(column(users, "id"), some(&["42", "0", "1", "-1"]));
    assert_eq!(
        column(users, "email"),
        some(&[
            "user1@example.com",
            "user2@example.com",
            "user3@example.com",
            "user4@example.com"
        ])
    );
    let status = column(users, "status");
    assert_eq!(status[0], None);
    assert_eq!(status[1], Some("active".to_string()));
    assert_eq!(column(users, "score")[0], Some("0".to_string()));

    assert_eq!(
        report.warnings,
        vec![
            GenerationWarning::UnknownTable {
                table: "ghosts".into()
            },
            GenerationWarning::UnknownColumn {
                table: "public.orders".into(),
                column: "nope".into()
            },
        ]
    );
}

#[test]
fn test_builtin_domain_overrides() {
    let config = r#"
seed: 9
default_checks: false
anchor: "2024-01-01T00:00:00Z"
tables:
  users:
    max_rows: 3
    columns:
      email: { domain: unique }
      status: { domain: timestamp, iterations: 2, days: 1 }
      score: { domain: numeric, step: 0.5, top: 2 }
"#;
    let (dir, schema, config) = setup(config, &[]);
    let mut generator = Generator::new(&schema, options(&config));
    config
        .apply(&mut generator, &RhaiHost::new(), dir.path())
        .unwrap();
    let report = generator.run().unwrap();

    let users = &report.table("public.users").unwrap().records;
    assert_eq!(users.len(), 3);
    let emails: Vec<String> = column(users, "email").into_iter().flatten().collect();
    assert_eq!(emails.len(), 3);
    assert!(emails.iter().all(|e| e.chars().count() == 20));
    assert!(emails[0] != emails[1] && emails[1] != emails[2] && emails[0] != emails[2]);
    assert_eq!(column(users, "status"), some(&["2024-01-01T00:00:00Z"; 3]));
    assert_eq!(column(users, "score")[0], Some("0".to_string()));
}

#[test]
fn test_broken_script_skips_table() {
    let config = r#"
default_checks: false
tables:
  users:
    columns:
      email: { domain: script, path: broken.rhai }
"#;
    let (dir, schema, config) = setup(config, &[("broken.rhai", "fn reset( {")]);
    let mut generator = Generator::new(&schema, options(&config));
    config
        .apply(&mut generator, &RhaiHost::new(), dir.path())
        .unwrap();
    let report = generator.run().unwrap();

    assert!(report.table("public.users").is_none());
    assert!(report.table("public.orders").is_some());
    assert!(matches!(
        &report.warnings[..],
        [GenerationWarning::ScriptFailed { table, script, .. }]
            if table == "public.users" && script == "broken.rhai"
    ));
}

#[test]
fn test_missing_script_file_is_error() {
    let config = r#"
tables:
  users:
    columns:
      email: { domain: script, path: nowhere.rhai }
"#;
    let (dir, schema, config) = setup(config, &[]);
    let mut generator = Generator::new(&schema, options(&config));
    let err = config
        .apply(&mut generator, &RhaiHost::new(), dir.path())
        .unwrap_err();
    assert!(err.to_string().contains("nowhere.rhai"), "{err}");
}

#[test]
fn test_check_script_adds_checks() {
    let config = r#"
tables:
  users:
    max_rows: 2
    check_script: checks.rhai
"#;
    let checks = r#"
fn table_checks(table) {
    #{ status: ["x", ()], unknown: [1] }
}
"#;
    let (dir, schema, config) = setup(config, &[("checks.rhai", checks)]);
    let mut generator = Generator::new(&schema, options(&config));
    config
        .apply(&mut generator, &RhaiHost::new(), dir.path())
        .unwrap();
    let report = generator.run().unwrap();

    let users = &report.table("public.users").unwrap().records;
    assert_eq!(column(users, "status"), vec![Some("x".to_string()), None]);
    assert!(report.warnings.contains(&GenerationWarning::UnknownColumn {
        table: "public.users".into(),
        column: "unknown".into()
    }));
}

#[test]
fn test_skip_table_from_config() {
    let config = "tables:\n  orders:\n    skip: true\n";
    let (dir, schema, config) = setup(config, &[]);
    let mut generator = Generator::new(&schema, options(&config));
    config
        .apply(&mut generator, &RhaiHost::new(), dir.path())
        .unwrap();
    let report = generator.run().unwrap();
    assert!(report.table("public.orders").is_none());
    assert!(report.table("public.users").is_some());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_invalid_yaml_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "tables: [not, a, map]").unwrap();
    assert!(GenerateYamlConfig::load(&path).is_err());
    assert!(GenerateYamlConfig::load(Path::new("/nonexistent/rowseed.yaml")).is_err());
}
