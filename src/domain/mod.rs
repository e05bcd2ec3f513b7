//! Value domains: finite, resettable cursors over candidate column values.
//!
//! Each domain implements a different family of boundary values:
//! - `integer`: zig-zag around zero up to a magnitude bound
//! - `numeric`: zig-zag in steps derived from precision/scale
//! - `timestamp`: an anchor instant, then growing offsets on both sides
//! - `enumeration`: a fixed list of labels
//! - `opaque`: fresh unique tokens for identifier-like columns
//! - `script`: user-supplied domains running in a sandbox

mod enumeration;
mod integer;
mod numeric;
mod opaque;
pub mod script;
mod timestamp;

pub use enumeration::EnumDomain;
pub use integer::IntegerDomain;
pub use numeric::NumericDomain;
pub use opaque::{OpaqueDomain, TokenFormat};
pub use script::{RhaiHost, ScriptHost, ScriptedDomain};
pub use timestamp::{TimestampDomain, TimestampFormat};

use crate::error::DomainError;
use crate::schema::{Column, ColumnId, ColumnType, TableId, TypeKind};
use chrono::{DateTime, Utc};

/// Default magnitude bound for integer domains
pub const DEFAULT_INTEGER_TOP: i64 = 1000;

/// Default number of values produced by timestamp domains
pub const DEFAULT_TIMESTAMP_VALUES: usize = 100;

/// Canonical truth pair used for boolean columns
pub const BOOLEAN_LABELS: [&str; 2] = ["True", "False"];

/// A stateful cursor over an ordered, finite sequence of candidate values.
///
/// `value` is only meaningful after `next` returned `true`.
pub trait ValueDomain {
    /// Rewind to before the first value
    fn reset(&mut self) -> Result<(), DomainError>;

    /// Advance; returns whether a value is available
    fn next(&mut self) -> Result<bool, DomainError>;

    /// The current value
    fn value(&mut self) -> Result<String, DomainError>;

    /// Maximum number of characters a value may have in the target column
    fn char_limit(&self) -> Option<usize> {
        None
    }

    /// True unless `next` is known to report exhaustion after finitely many
    /// values. Callers bound the draws of unbounded domains.
    fn is_unbounded(&self) -> bool {
        true
    }
}

/// Reset a domain and collect up to `limit` values from it
pub fn enumerate(domain: &mut dyn ValueDomain, limit: usize) -> Result<Vec<String>, DomainError> {
    domain.reset()?;
    let mut values = Vec::new();
    while values.len() < limit && domain.next()? {
        values.push(domain.value()?);
    }
    Ok(values)
}

/// Zig-zag walk around zero: 0, 1, -1, 2, -2, ...
pub(crate) fn zigzag(index: u64) -> i64 {
    let magnitude = index.div_ceil(2) as i64;
    if index % 2 == 1 {
        magnitude
    } else {
        -magnitude
    }
}

/// Type families with a built-in value domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Boolean,
    Enum,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Numeric,
    Text,
    Binary,
    Bit,
    Uuid,
    Date,
    Time,
    Timestamp,
}

impl TypeFamily {
    /// Classify a column type, or `None` when no built-in domain fits
    pub fn classify(col_type: &ColumnType) -> Option<Self> {
        match col_type.kind {
            TypeKind::Enum(_) => return Some(TypeFamily::Enum),
            TypeKind::Base => {}
            _ => return None,
        }
        if !col_type.is_builtin() {
            return None;
        }

        let family = match col_type.name.as_str() {
            "bool" | "boolean" => TypeFamily::Boolean,
            "int2" | "smallint" | "smallserial" | "serial2" | "tinyint" => TypeFamily::SmallInt,
            "int" | "int4" | "integer" | "mediumint" | "serial" | "serial4" => TypeFamily::Integer,
            "int8" | "bigint" | "bigserial" | "serial8" => TypeFamily::BigInt,
            "real" | "float4" | "float8" | "float" | "double" | "double precision" => {
                TypeFamily::Float
            }
            "numeric" | "decimal" | "money" => TypeFamily::Numeric,
            "text" | "varchar" | "character varying" | "char" | "character" | "bpchar"
            | "name" | "citext" | "tinytext" | "mediumtext" | "longtext" | "nvarchar"
            | "nchar" => TypeFamily::Text,
            "bytea" | "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob"
            | "longblob" => TypeFamily::Binary,
            "bit" | "varbit" | "bit varying" => TypeFamily::Bit,
            "uuid" => TypeFamily::Uuid,
            "date" => TypeFamily::Date,
            "time" | "timetz" | "time with time zone" | "time without time zone" => {
                TypeFamily::Time
            }
            "timestamp" | "timestamptz" | "datetime" | "timestamp with time zone"
            | "timestamp without time zone" | "smalldatetime" | "datetime2" => {
                TypeFamily::Timestamp
            }
            _ => return None,
        };
        Some(family)
    }

    /// Families whose literals are written without quotes
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            TypeFamily::SmallInt
                | TypeFamily::Integer
                | TypeFamily::BigInt
                | TypeFamily::Float
                | TypeFamily::Numeric
        )
    }
}

/// Run-wide parameters for built-in domains
#[derive(Debug, Clone)]
pub struct DomainContext {
    /// Base seed for opaque-token domains
    pub seed: u64,
    /// Instant timestamp domains are anchored at
    pub anchor: DateTime<Utc>,
    /// Magnitude bound for integer domains
    pub integer_top: i64,
    /// Number of values timestamp domains produce
    pub timestamp_values: usize,
}

impl DomainContext {
    pub fn new(seed: u64, anchor: DateTime<Utc>) -> Self {
        Self {
            seed,
            anchor,
            integer_top: DEFAULT_INTEGER_TOP,
            timestamp_values: DEFAULT_TIMESTAMP_VALUES,
        }
    }

    /// Per-column seed so that sibling columns draw different tokens
    pub fn column_seed(&self, table: TableId, column: ColumnId) -> u64 {
        let slot = ((table.0 as u64) << 16) | column.0 as u64;
        self.seed
            .wrapping_add(slot.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

/// Built-in domain for a column, chosen from its type family
pub fn builtin_domain(
    table: TableId,
    column: &Column,
    ctx: &DomainContext,
) -> Result<Box<dyn ValueDomain>, DomainError> {
    let col_type = &column.col_type;
    let family = TypeFamily::classify(col_type).ok_or_else(|| DomainError::Unsupported {
        type_name: col_type.display_name(),
    })?;
    let limit = col_type.max_length.map(|len| len as usize);
    let seed = ctx.column_seed(table, column.ordinal);

    let domain: Box<dyn ValueDomain> = match family {
        TypeFamily::Boolean => Box::new(EnumDomain::new(
            BOOLEAN_LABELS.iter().map(|s| s.to_string()).collect(),
        )),
        TypeFamily::Enum => {
            let labels = match &col_type.kind {
                TypeKind::Enum(labels) => labels.clone(),
                _ => Vec::new(),
            };
            Box::new(EnumDomain::new(labels))
        }
        TypeFamily::SmallInt | TypeFamily::Integer | TypeFamily::BigInt => {
            Box::new(IntegerDomain::new(ctx.integer_top))
        }
        TypeFamily::Float => Box::new(NumericDomain::for_precision(None, None)),
        TypeFamily::Numeric => Box::new(NumericDomain::for_precision(
            col_type.precision,
            col_type.scale,
        )),
        TypeFamily::Text | TypeFamily::Uuid => {
            Box::new(OpaqueDomain::new(seed, TokenFormat::Uuid).with_char_limit(limit))
        }
        TypeFamily::Binary => Box::new(OpaqueDomain::new(seed, TokenFormat::Hex)),
        TypeFamily::Bit => {
            Box::new(OpaqueDomain::new(seed, TokenFormat::Bits).with_char_limit(limit))
        }
        TypeFamily::Date | TypeFamily::Time | TypeFamily::Timestamp => {
            let format = match family {
                TypeFamily::Date => TimestampFormat::Date,
                TypeFamily::Time => TimestampFormat::Time,
                _ => TimestampFormat::DateTime,
            };
            Box::new(
                TimestampDomain::new(ctx.anchor, 1, 1, ctx.timestamp_values).with_format(format),
            )
        }
    };

    Ok(domain)
}
