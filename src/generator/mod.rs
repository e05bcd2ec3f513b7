//! Row generation across a whole schema.
//!
//! The [`Generator`] walks tables in foreign-key insertion order and, for
//! each one:
//! - resolves a value domain per column (caller override or built-in)
//! - picks the seed rows (caller checks or default boundary checks)
//! - runs a [`TableRecordGenerator`] session
//!
//! Per-table failures become [`GenerationWarning`]s; only a foreign-key cycle
//! aborts the run.

mod checks;
mod config;
mod table;
mod warnings;

pub use checks::{boundary_values, default_checks};
pub use config::{CheckLiteral, DomainSpec, GenerateYamlConfig, TableConfig};
pub use table::{TableRecordGenerator, TableStats, DEFAULT_MAX_DRAWS, DEFAULT_MAX_ROWS};
pub use warnings::{print_summary, GenerationWarning, WarningCollector};

use crate::domain::{
    builtin_domain, DomainContext, ValueDomain, DEFAULT_INTEGER_TOP, DEFAULT_TIMESTAMP_VALUES,
};
use crate::error::{DomainError, Error};
use crate::record::{PartialRecord, PartialRecords, Records};
use crate::schema::{ColumnId, Identifier, Schema, SchemaGraph, Table, TableId};
use ahash::{AHashMap, AHashSet};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run-wide generation settings
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Seed for opaque-token domains
    pub seed: u64,
    /// Row cap per table unless overridden per table
    pub max_rows: usize,
    /// Draw budget per value for unbounded domains
    pub max_draws: usize,
    /// Derive check rows from column boundary values when none are supplied
    pub default_checks: bool,
    /// Instant timestamp domains are anchored at
    pub anchor: DateTime<Utc>,
    /// Magnitude bound for built-in integer domains
    pub integer_top: i64,
    /// Number of values built-in timestamp domains produce
    pub timestamp_values: usize,
    /// Tables not started by this instant are reported and left out
    pub deadline: Option<Instant>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            seed: rand::random(),
            max_rows: DEFAULT_MAX_ROWS,
            max_draws: DEFAULT_MAX_DRAWS,
            default_checks: true,
            anchor: Utc::now(),
            integer_top: DEFAULT_INTEGER_TOP,
            timestamp_values: DEFAULT_TIMESTAMP_VALUES,
            deadline: None,
        }
    }
}

impl GenerateOptions {
    /// Parameters for the built-in domains
    pub fn domain_context(&self) -> DomainContext {
        DomainContext {
            seed: self.seed,
            anchor: self.anchor,
            integer_top: self.integer_top,
            timestamp_values: self.timestamp_values,
        }
    }
}

/// Generated rows of one table
#[derive(Debug, Clone)]
pub struct TableOutput {
    pub table: TableId,
    pub name: Identifier,
    pub records: Records,
    /// Fill rows ended because a domain ran out of unique values
    pub exhausted: bool,
}

/// Result of a generation run
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Canonical names of all tables in insertion order
    pub order: Vec<String>,
    /// Tables that produced rows, in insertion order
    pub tables: Vec<TableOutput>,
    pub warnings: Vec<GenerationWarning>,
    /// Warnings discarded by the collector limit
    pub dropped_warnings: usize,
}

impl GenerationReport {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.records.len()).sum()
    }

    /// Output of a table by canonical name
    pub fn table(&self, name: &str) -> Option<&TableOutput> {
        self.tables.iter().find(|t| t.name.canonical() == name)
    }

    pub fn print_warnings(&self) {
        print_summary(&self.warnings, self.dropped_warnings);
    }
}

/// Per-table progress, reported after each table is handled
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub done: usize,
    pub total: usize,
    pub table: &'a Identifier,
}

/// Generates rows for every table of a schema.
pub struct Generator<'s> {
    schema: &'s Schema,
    options: GenerateOptions,
    domains: AHashMap<TableId, BTreeMap<ColumnId, Box<dyn ValueDomain>>>,
    checks: AHashMap<TableId, PartialRecords>,
    table_max_rows: AHashMap<TableId, usize>,
    skipped: AHashSet<TableId>,
    warnings: WarningCollector,
}

impl<'s> Generator<'s> {
    pub fn new(schema: &'s Schema, options: GenerateOptions) -> Self {
        Self {
            schema,
            options,
            domains: AHashMap::new(),
            checks: AHashMap::new(),
            table_max_rows: AHashMap::new(),
            skipped: AHashSet::new(),
            warnings: WarningCollector::new(),
        }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Use `domain` instead of the built-in domain for one column
    pub fn with_domain(
        &mut self,
        table: TableId,
        column: ColumnId,
        domain: Box<dyn ValueDomain>,
    ) -> &mut Self {
        self.domains.entry(table).or_default().insert(column, domain);
        self
    }

    /// Use `checks` as the table's seed rows instead of the default checks
    pub fn with_checks(&mut self, table: TableId, checks: PartialRecords) -> &mut Self {
        self.checks.insert(table, checks);
        self
    }

    /// Add one seed row to the table's caller checks
    pub fn add_check(&mut self, table: TableId, check: PartialRecord) -> &mut Self {
        self.checks.entry(table).or_default().merge_add(check);
        self
    }

    pub fn with_table_max_rows(&mut self, table: TableId, max_rows: usize) -> &mut Self {
        self.table_max_rows.insert(table, max_rows);
        self
    }

    /// Leave a table out of the run
    pub fn skip_table(&mut self, table: TableId) -> &mut Self {
        self.skipped.insert(table);
        self
    }

    /// Record a warning raised while preparing the run
    pub fn add_warning(&mut self, warning: GenerationWarning) {
        warn!(table = warning.table(), "{}", warning);
        self.warnings.add(warning);
    }

    pub fn run(self) -> Result<GenerationReport, Error> {
        self.run_with_progress(|_| {})
    }

    /// Generate every table, calling `on_progress` after each one
    pub fn run_with_progress<F>(mut self, mut on_progress: F) -> Result<GenerationReport, Error>
    where
        F: FnMut(Progress<'_>),
    {
        let schema = self.schema;
        let order = SchemaGraph::from_schema(schema).insertion_order()?;
        let total = order.len();
        let mut report = GenerationReport {
            order: order
                .iter()
                .filter_map(|&id| schema.table(id))
                .map(|t| t.name.canonical())
                .collect(),
            ..Default::default()
        };

        for (i, &table_id) in order.iter().enumerate() {
            let Some(table) = schema.table(table_id) else {
                continue;
            };

            if self.options.deadline.is_some_and(|d| Instant::now() >= d) {
                for &late in &order[i..] {
                    if let Some(t) = schema.table(late) {
                        self.add_warning(GenerationWarning::DeadlineExceeded {
                            table: t.name.canonical(),
                        });
                    }
                }
                break;
            }

            if self.skipped.contains(&table_id) {
                debug!(table = %table.name, "table skipped by request");
            } else {
                match self.generate_table(table) {
                    Ok(Some(output)) => {
                        debug!(table = %table.name, rows = output.records.len(), "table generated");
                        report.tables.push(output);
                    }
                    Ok(None) => {}
                    Err(err) => self.add_warning(table_failure(table, err)),
                }
            }

            on_progress(Progress {
                done: i + 1,
                total,
                table: &table.name,
            });
        }

        info!(
            tables = report.tables.len(),
            rows = report.total_rows(),
            warnings = self.warnings.count(),
            "generation finished"
        );
        report.dropped_warnings = self.warnings.dropped();
        report.warnings = self.warnings.into_warnings();
        Ok(report)
    }

    /// One table session; `Ok(None)` when the table has nothing to emit
    fn generate_table(&mut self, table: &'s Table) -> Result<Option<TableOutput>, Error> {
        let name = table.name.canonical();
        let ctx = self.options.domain_context();
        let mut overrides = self.domains.remove(&table.id).unwrap_or_default();

        let mut domains: BTreeMap<ColumnId, Box<dyn ValueDomain>> = BTreeMap::new();
        for column in &table.columns {
            if column.is_generated {
                continue;
            }
            if let Some(domain) = overrides.remove(&column.ordinal) {
                domains.insert(column.ordinal, domain);
                continue;
            }
            match builtin_domain(table.id, column, &ctx) {
                Ok(domain) => {
                    domains.insert(column.ordinal, domain);
                }
                Err(DomainError::Unsupported { type_name })
                    if column.is_nullable || column.has_default =>
                {
                    self.add_warning(GenerationWarning::UnsupportedColumn {
                        table: name.clone(),
                        column: column.name.clone(),
                        type_name,
                    });
                }
                Err(err) => return Err(Error::from_domain(&name, &column.name, err)),
            }
        }

        if domains.is_empty() {
            self.add_warning(GenerationWarning::TableSkipped {
                table: name,
                reason: "no columns to generate".to_string(),
            });
            return Ok(None);
        }

        let seeds: Vec<PartialRecord> = match self.checks.remove(&table.id) {
            Some(checks) => checks.into_vec(),
            None if self.options.default_checks => {
                let emitted: Vec<ColumnId> = domains.keys().copied().collect();
                default_checks(table, &emitted).into_vec()
            }
            None => Vec::new(),
        };
        debug!(table = %table.name, seeds = seeds.len(), columns = domains.len(), "generating table");

        let max_rows = self
            .table_max_rows
            .get(&table.id)
            .copied()
            .unwrap_or(self.options.max_rows);
        let mut session = TableRecordGenerator::new(table, domains)
            .with_max_rows(max_rows)
            .with_max_draws(self.options.max_draws);
        let records = session.generate(&seeds)?;

        let stats = session.stats().clone();
        for index in stats.conflicting_checks {
            self.add_warning(GenerationWarning::ConflictingCheck {
                table: name.clone(),
                index,
            });
        }

        Ok(Some(TableOutput {
            table: table.id,
            name: table.name.clone(),
            records,
            exhausted: stats.exhausted,
        }))
    }
}

/// Warning for a table whose session failed
fn table_failure(table: &Table, err: Error) -> GenerationWarning {
    match err {
        Error::Script {
            column,
            script,
            message,
            ..
        } => GenerationWarning::ScriptFailed {
            table: table.name.canonical(),
            script,
            message: format!("column {column}: {message}"),
        },
        other => GenerationWarning::TableSkipped {
            table: table.name.canonical(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn options() -> GenerateOptions {
        GenerateOptions {
            seed: 7,
            integer_top: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_table_failure_maps_script_errors() {
        let table = Table::new(Identifier::parse("public.t"), TableId(0));
        let warning = table_failure(
            &table,
            Error::Script {
                table: "public.t".into(),
                column: "c".into(),
                script: "s.rhai".into(),
                message: "boom".into(),
            },
        );
        assert!(matches!(warning, GenerationWarning::ScriptFailed { .. }));
    }

    #[test]
    fn test_generated_columns_not_emitted() {
        let mut schema = Schema::new();
        let mut table = Table::new(Identifier::parse("public.t"), TableId(0));
        table.add_column("id", ColumnType::base("int4"));
        table.add_column("total", ColumnType::base("int4")).is_generated = true;
        table.set_primary_key(vec![ColumnId(0)]);
        schema.add_table(table);

        let report = Generator::new(&schema, options()).run().unwrap();
        let output = report.table("public.t").unwrap();
        assert_eq!(output.records.columns().len(), 1);
        assert_eq!(output.records.columns()[0].name, "id");
    }
}
