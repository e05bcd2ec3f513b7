//! Error types for ordering and row generation.

/// Errors raised by the generation core.
///
/// Only [`Error::Cycle`] is fatal to a run; every other variant is local to
/// one table and is turned into a warning by the orchestrator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Foreign keys form a cycle, so no insertion order exists
    #[error("foreign key cycle detected among tables: {}", .tables.join(", "))]
    Cycle { tables: Vec<String> },

    /// The column's type has no built-in or supplied value domain
    #[error("no value domain for {table}.{column} (type {type_name})")]
    UnsupportedDomain {
        table: String,
        column: String,
        type_name: String,
    },

    /// No unique-respecting value remained in the column's domain
    #[error("value domain for {table}.{column} exhausted before a unique value was found")]
    Exhausted { table: String, column: String },

    /// A scripted domain call failed
    #[error("script '{script}' failed for {table}.{column}: {message}")]
    Script {
        table: String,
        column: String,
        script: String,
        message: String,
    },
}

impl Error {
    /// Attach table/column context to a domain-level error
    pub fn from_domain(table: &str, column: &str, err: DomainError) -> Self {
        match err {
            DomainError::Unsupported { type_name } => Error::UnsupportedDomain {
                table: table.to_string(),
                column: column.to_string(),
                type_name,
            },
            DomainError::Script { script, message } => Error::Script {
                table: table.to_string(),
                column: column.to_string(),
                script,
                message,
            },
        }
    }
}

/// Errors raised by a value domain before table context is known.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("no built-in value domain for type {type_name}")]
    Unsupported { type_name: String },

    #[error("script '{script}': {message}")]
    Script { script: String, message: String },
}
