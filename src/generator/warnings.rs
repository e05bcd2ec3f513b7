//! Warning system for generation runs.
//!
//! Tracks per-table problems that do not abort the run: columns without a
//! value domain, skipped tables, dropped check rows and config entries that
//! do not match the schema.

use schemars::JsonSchema;
use serde::Serialize;

/// Warning types that can occur during generation
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationWarning {
    /// Column has no value domain and was left out of the table's rows
    UnsupportedColumn {
        table: String,
        column: String,
        type_name: String,
    },
    /// No rows were produced for the table
    TableSkipped { table: String, reason: String },
    /// A check row collided with an earlier row on a unique index and was dropped
    ConflictingCheck { table: String, index: String },
    /// The deadline passed before the table was reached
    DeadlineExceeded { table: String },
    /// A script could not be loaded or run while preparing the table
    ScriptFailed {
        table: String,
        script: String,
        message: String,
    },
    /// Configuration names a table that is not in the schema
    UnknownTable { table: String },
    /// Configuration names a column that is not in the table
    UnknownColumn { table: String, column: String },
}

impl GenerationWarning {
    /// Table the warning belongs to
    pub fn table(&self) -> &str {
        match self {
            GenerationWarning::UnsupportedColumn { table, .. }
            | GenerationWarning::TableSkipped { table, .. }
            | GenerationWarning::ConflictingCheck { table, .. }
            | GenerationWarning::DeadlineExceeded { table }
            | GenerationWarning::ScriptFailed { table, .. }
            | GenerationWarning::UnknownTable { table }
            | GenerationWarning::UnknownColumn { table, .. } => table,
        }
    }
}

impl std::fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationWarning::UnsupportedColumn {
                table,
                column,
                type_name,
            } => write!(
                f,
                "Column {}.{} ({}) has no value domain, left out of generated rows",
                table, column, type_name
            ),
            GenerationWarning::TableSkipped { table, reason } => {
                write!(f, "Skipped table {}: {}", table, reason)
            }
            GenerationWarning::ConflictingCheck { table, index } => write!(
                f,
                "Check row for {} dropped: duplicates a key of unique index {}",
                table, index
            ),
            GenerationWarning::DeadlineExceeded { table } => {
                write!(f, "Deadline exceeded before table {}", table)
            }
            GenerationWarning::ScriptFailed {
                table,
                script,
                message,
            } => write!(f, "Script {} failed for {}: {}", script, table, message),
            GenerationWarning::UnknownTable { table } => {
                write!(f, "Config references unknown table {}", table)
            }
            GenerationWarning::UnknownColumn { table, column } => {
                write!(f, "Config references unknown column {}.{}", table, column)
            }
        }
    }
}

/// Collects warnings during a generation run
#[derive(Debug)]
pub struct WarningCollector {
    warnings: Vec<GenerationWarning>,
    max_warnings: usize,
    dropped: usize,
}

impl Default for WarningCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl WarningCollector {
    pub fn new() -> Self {
        Self::with_limit(1000)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            warnings: Vec::new(),
            max_warnings: limit,
            dropped: 0,
        }
    }

    /// Add a warning; exact duplicates are kept once
    pub fn add(&mut self, warning: GenerationWarning) {
        if self.warnings.contains(&warning) {
            return;
        }
        if self.warnings.len() < self.max_warnings {
            self.warnings.push(warning);
        } else {
            self.dropped += 1;
        }
    }

    /// Get all collected warnings
    pub fn warnings(&self) -> &[GenerationWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<GenerationWarning> {
        self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn count(&self) -> usize {
        self.warnings.len()
    }

    /// Warnings discarded after the limit was reached
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Print summary of warnings
    pub fn print_summary(&self) {
        print_summary(&self.warnings, self.dropped);
    }
}

/// Print a warning list to stderr
pub fn print_summary(warnings: &[GenerationWarning], dropped: usize) {
    if warnings.is_empty() {
        return;
    }

    eprintln!("\nGeneration warnings ({}):", warnings.len());
    for warning in warnings {
        eprintln!("  ⚠ {}", warning);
    }

    if dropped > 0 {
        eprintln!("  ... ({} additional warnings truncated)", dropped);
    }
}
