//! YAML configuration for the generate command.
//!
//! Supports run-wide settings, per-column domain overrides, explicit check
//! rows and script-provided checks per table.

use super::{GenerateOptions, GenerationWarning, Generator};
use crate::domain::{
    EnumDomain, IntegerDomain, NumericDomain, OpaqueDomain, ScriptHost, TimestampDomain,
    TimestampFormat, TokenFormat, TypeFamily, ValueDomain, BOOLEAN_LABELS,
    DEFAULT_INTEGER_TOP,
};
use crate::error::DomainError;
use crate::record::{PartialRecord, Value};
use crate::schema::{Column, Table};
use anyhow::Context;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Value domain chosen for a column in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "domain", rename_all = "lowercase")]
pub enum DomainSpec {
    /// Zig-zag integers up to `top` in magnitude
    Integer { top: Option<i64> },
    /// Zig-zag decimals; omitted fields follow the column's precision/scale
    Numeric { step: Option<f64>, top: Option<f64> },
    /// Anchor instant, then alternating offsets
    Timestamp {
        iterations: Option<usize>,
        days: Option<i64>,
        seconds: Option<i64>,
    },
    /// Fixed list of values
    Enum { values: Vec<String> },
    /// Fresh unique tokens
    Unique,
    /// Script file implementing the domain, relative to the config file
    Script { path: PathBuf },
}

/// A literal in a check row; `null` means SQL NULL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CheckLiteral {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CheckLiteral {
    pub fn render(&self) -> String {
        match self {
            CheckLiteral::Bool(true) => BOOLEAN_LABELS[0].to_string(),
            CheckLiteral::Bool(false) => BOOLEAN_LABELS[1].to_string(),
            CheckLiteral::Int(v) => v.to_string(),
            CheckLiteral::Float(v) => v.to_string(),
            CheckLiteral::Text(v) => v.clone(),
        }
    }
}

/// Per-table generation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TableConfig {
    /// Skip this table entirely
    pub skip: bool,
    /// Row cap for this table (overrides the run-wide cap)
    pub max_rows: Option<usize>,
    /// Domain overrides by column name
    pub columns: BTreeMap<String, DomainSpec>,
    /// Explicit check rows, column name to literal; these replace the default checks
    pub checks: Vec<BTreeMap<String, Option<CheckLiteral>>>,
    /// Script whose `table_checks` function supplies more check values
    pub check_script: Option<PathBuf>,
}

/// Complete YAML configuration for the generate command
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GenerateYamlConfig {
    /// Seed for opaque-token domains
    pub seed: Option<u64>,
    /// Row cap per table
    pub max_rows: Option<usize>,
    /// Derive check rows from column boundary values
    pub default_checks: Option<bool>,
    /// RFC 3339 anchor for timestamp domains (defaults to now)
    pub anchor: Option<String>,
    /// Per-table settings, keyed by `schema.table` or bare table name
    pub tables: BTreeMap<String, TableConfig>,
}

impl GenerateYamlConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: GenerateYamlConfig = serde_yaml_ng::from_str(content)?;
        Ok(config)
    }

    /// Overlay the file's run-wide settings on `options`
    pub fn apply_options(&self, options: &mut GenerateOptions) -> anyhow::Result<()> {
        if let Some(seed) = self.seed {
            options.seed = seed;
        }
        if let Some(max_rows) = self.max_rows {
            options.max_rows = max_rows;
        }
        if let Some(default_checks) = self.default_checks {
            options.default_checks = default_checks;
        }
        if let Some(anchor) = &self.anchor {
            options.anchor = DateTime::parse_from_rfc3339(anchor)
                .with_context(|| format!("Invalid anchor timestamp '{}'", anchor))?
                .with_timezone(&Utc);
        }
        Ok(())
    }

    /// Register the per-table settings with `generator`.
    ///
    /// Names that do not match the schema and scripts that fail to load are
    /// reported as warnings; a table whose scripted domain fails to load is
    /// skipped. Unreadable script files are errors. Relative script paths
    /// resolve against `base_dir`.
    pub fn apply(
        &self,
        generator: &mut Generator<'_>,
        host: &dyn ScriptHost,
        base_dir: &Path,
    ) -> anyhow::Result<()> {
        let schema = generator.schema();

        for (table_name, table_config) in &self.tables {
            let Some(table) = schema.get_table(table_name) else {
                generator.add_warning(GenerationWarning::UnknownTable {
                    table: table_name.clone(),
                });
                continue;
            };

            if table_config.skip {
                generator.skip_table(table.id);
                continue;
            }
            if let Some(max_rows) = table_config.max_rows {
                generator.with_table_max_rows(table.id, max_rows);
            }

            if !self.apply_domains(generator, host, base_dir, table, table_config)? {
                generator.skip_table(table.id);
                continue;
            }

            for check in &table_config.checks {
                let mut record = PartialRecord::new();
                for (column_name, literal) in check {
                    match table.get_column_id(column_name) {
                        Some(column) => record.set(column, literal.as_ref().map(|l| l.render())),
                        None => generator.add_warning(GenerationWarning::UnknownColumn {
                            table: table.name.canonical(),
                            column: column_name.clone(),
                        }),
                    }
                }
                generator.add_check(table.id, record);
            }

            if let Some(path) = &table_config.check_script {
                let (script, source) = read_script(base_dir, path)?;
                match host.table_checks(&script, &source, table) {
                    Ok(checks) => add_script_checks(generator, table, checks),
                    Err(err) => generator.add_warning(script_warning(table, &script, err)),
                }
            }
        }

        Ok(())
    }

    /// Install column overrides; returns `false` when a script failed to load
    fn apply_domains(
        &self,
        generator: &mut Generator<'_>,
        host: &dyn ScriptHost,
        base_dir: &Path,
        table: &Table,
        table_config: &TableConfig,
    ) -> anyhow::Result<bool> {
        for (column_name, spec) in &table_config.columns {
            let Some(column) = table.get_column(column_name) else {
                generator.add_warning(GenerationWarning::UnknownColumn {
                    table: table.name.canonical(),
                    column: column_name.clone(),
                });
                continue;
            };

            let col_type = &column.col_type;
            let domain: Box<dyn ValueDomain> = match spec {
                DomainSpec::Script { path } => {
                    let (script, source) = read_script(base_dir, path)?;
                    match host.load_domain(&script, &source, table, column) {
                        Ok(domain) => domain,
                        Err(err) => {
                            generator.add_warning(script_warning(table, &script, err));
                            return Ok(false);
                        }
                    }
                }
                DomainSpec::Integer { top } => {
                    Box::new(IntegerDomain::new(top.unwrap_or(DEFAULT_INTEGER_TOP)))
                }
                DomainSpec::Numeric {
                    step: Some(step),
                    top: Some(top),
                } => Box::new(NumericDomain::new(*step, *top)),
                DomainSpec::Numeric { .. } => Box::new(NumericDomain::for_precision(
                    col_type.precision,
                    col_type.scale,
                )),
                DomainSpec::Timestamp {
                    iterations,
                    days,
                    seconds,
                } => {
                    let options = generator.options();
                    Box::new(
                        TimestampDomain::new(
                            options.anchor,
                            days.unwrap_or(1),
                            seconds.unwrap_or(1),
                            iterations.unwrap_or(options.timestamp_values),
                        )
                        .with_format(timestamp_format(column)),
                    )
                }
                DomainSpec::Enum { values } => Box::new(EnumDomain::new(values.clone())),
                DomainSpec::Unique => unique_domain(generator.options(), table, column),
            };
            debug!(table = %table.name, column = %column.name, "domain override from config");
            generator.with_domain(table.id, column.ordinal, domain);
        }
        Ok(true)
    }
}

fn timestamp_format(column: &Column) -> TimestampFormat {
    match TypeFamily::classify(&column.col_type) {
        Some(TypeFamily::Date) => TimestampFormat::Date,
        Some(TypeFamily::Time) => TimestampFormat::Time,
        _ => TimestampFormat::DateTime,
    }
}

/// Opaque tokens shaped for the column's type family
fn unique_domain(
    options: &GenerateOptions,
    table: &Table,
    column: &Column,
) -> Box<dyn ValueDomain> {
    let format = match TypeFamily::classify(&column.col_type) {
        Some(TypeFamily::Binary) => TokenFormat::Hex,
        Some(TypeFamily::Bit) => TokenFormat::Bits,
        _ => TokenFormat::Uuid,
    };
    let seed = options.domain_context().column_seed(table.id, column.ordinal);
    let limit = column.col_type.max_length.map(|len| len as usize);
    Box::new(OpaqueDomain::new(seed, format).with_char_limit(limit))
}

/// Read a script file, returning its display name and source
fn read_script(base_dir: &Path, path: &Path) -> anyhow::Result<(String, String)> {
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };
    let source = fs::read_to_string(&full)
        .with_context(|| format!("Failed to read script {}", full.display()))?;
    Ok((path.display().to_string(), source))
}

fn add_script_checks(
    generator: &mut Generator<'_>,
    table: &Table,
    checks: BTreeMap<String, Vec<Value>>,
) {
    for (column_name, values) in checks {
        let Some(column) = table.get_column_id(&column_name) else {
            generator.add_warning(GenerationWarning::UnknownColumn {
                table: table.name.canonical(),
                column: column_name,
            });
            continue;
        };
        for value in values {
            generator.add_check(table.id, PartialRecord::new().with(column, value));
        }
    }
}

fn script_warning(table: &Table, script: &str, err: DomainError) -> GenerationWarning {
    let message = match err {
        DomainError::Script { message, .. } => message,
        other => other.to_string(),
    };
    GenerationWarning::ScriptFailed {
        table: table.name.canonical(),
        script: script.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domains() {
        let yaml = r#"
tables:
  users:
    columns:
      id: { domain: integer, top: 5 }
      score: { domain: numeric, step: 0.25, top: 1 }
      token: { domain: unique }
      email: { domain: script, path: email.rhai }
"#;
        let config = GenerateYamlConfig::parse(yaml).unwrap();
        let users = &config.tables["users"];
        assert_eq!(users.columns["id"], DomainSpec::Integer { top: Some(5) });
        assert_eq!(users.columns["token"], DomainSpec::Unique);
        assert_eq!(
            users.columns["email"],
            DomainSpec::Script {
                path: PathBuf::from("email.rhai")
            }
        );
    }

    #[test]
    fn test_check_literals() {
        let yaml = r#"
tables:
  users:
    checks:
      - { id: 0, active: true, name: "x", note: null }
"#;
        let config = GenerateYamlConfig::parse(yaml).unwrap();
        let check = &config.tables["users"].checks[0];
        assert_eq!(check["id"].as_ref().map(|l| l.render()), Some("0".into()));
        assert_eq!(
            check["active"].as_ref().map(|l| l.render()),
            Some("True".into())
        );
        assert_eq!(check["note"], None);
    }

    #[test]
    fn test_apply_options() {
        let config = GenerateYamlConfig::parse(
            "seed: 9\nmax_rows: 12\ndefault_checks: false\nanchor: \"2024-01-01T00:00:00Z\"\n",
        )
        .unwrap();
        let mut options = GenerateOptions::default();
        config.apply_options(&mut options).unwrap();
        assert_eq!(options.seed, 9);
        assert_eq!(options.max_rows, 12);
        assert!(!options.default_checks);
        assert_eq!(options.anchor.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_bad_anchor_is_error() {
        let config = GenerateYamlConfig::parse("anchor: yesterday\n").unwrap();
        let mut options = GenerateOptions::default();
        assert!(config.apply_options(&mut options).is_err());
    }
}
