//! Schema model for row generation.
//!
//! This module provides:
//! - Data models for tables, columns, indexes, constraints and foreign keys
//! - DDL parsing for building a schema from CREATE/ALTER statements
//! - Dependency graph construction with topological sorting

mod ddl;
mod graph;

pub use ddl::*;
pub use graph::*;

use ahash::AHashMap;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Schema name used when a statement does not qualify its table.
pub const DEFAULT_SCHEMA: &str = "public";

/// Unique identifier for a table within a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

/// Column ordinal within a table.
///
/// Ordinals are stable per table and are the key of every column-keyed
/// container used during generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ColumnId(pub u16);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColumnId({})", self.0)
    }
}

/// Qualified object name: `(schema, name)` plus an optional catalog oid.
///
/// Equality and hashing only consider the schema and the name.
#[derive(Debug, Clone, Eq)]
pub struct Identifier {
    pub schema: String,
    pub name: String,
    pub oid: Option<u32>,
}

impl Identifier {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            oid: None,
        }
    }

    /// Parse `schema.name` or a bare `name` (which lands in the default schema)
    pub fn parse(qualified: &str) -> Self {
        match qualified.split_once('.') {
            Some((schema, name)) => Self::new(schema, name),
            None => Self::new(DEFAULT_SCHEMA, qualified),
        }
    }

    pub fn with_oid(mut self, oid: u32) -> Self {
        self.oid = Some(oid);
        self
    }

    /// Canonical `schema.name` form, used as a map key
    pub fn canonical(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.name == other.name
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.schema, &self.name).cmp(&(&other.schema, &other.name))
    }
}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Schemas whose types are considered built in
pub const CATALOG_SCHEMAS: &[&str] = &["pg_catalog", "information_schema"];

/// Structural kind of a column type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Plain scalar type
    Base,
    /// Array of the named element type
    Array,
    /// Enumerated type with its labels in declaration order
    Enum(Vec<String>),
    Range,
    Multirange,
    /// User-defined domain over another type
    Domain,
    Composite,
    Pseudo,
}

/// Type descriptor for a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    /// Normalized lower-case type name without modifiers (e.g. `varchar`, `int4`)
    pub name: String,
    /// Schema the type lives in
    pub schema: String,
    pub kind: TypeKind,
    /// Declared character/bit length (`varchar(64)`, `bit(8)`)
    pub max_length: Option<u32>,
    /// Declared numeric precision
    pub precision: Option<u32>,
    /// Declared numeric scale
    pub scale: Option<u32>,
}

impl ColumnType {
    /// A built-in scalar type
    pub fn base(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            schema: "pg_catalog".to_string(),
            kind: TypeKind::Base,
            max_length: None,
            precision: None,
            scale: None,
        }
    }

    /// An enum type with the given labels
    pub fn enumeration(schema: &str, name: &str, labels: Vec<String>) -> Self {
        Self {
            name: name.to_lowercase(),
            schema: schema.to_string(),
            kind: TypeKind::Enum(labels),
            max_length: None,
            precision: None,
            scale: None,
        }
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.max_length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: u32, scale: Option<u32>) -> Self {
        self.precision = Some(precision);
        self.scale = scale;
        self
    }

    /// Whether the type lives in a built-in catalog schema
    pub fn is_builtin(&self) -> bool {
        CATALOG_SCHEMAS.contains(&self.schema.as_str())
    }

    /// Human readable type name, e.g. `varchar(64)` or `numeric(10,2)`
    pub fn display_name(&self) -> String {
        let mut name = self.name.clone();
        match (self.max_length, self.precision, self.scale) {
            (Some(len), _, _) => name.push_str(&format!("({len})")),
            (None, Some(p), Some(s)) => name.push_str(&format!("({p},{s})")),
            (None, Some(p), None) => name.push_str(&format!("({p})")),
            _ => {}
        }
        if self.kind == TypeKind::Array {
            name.push_str("[]");
        }
        name
    }
}

/// Column definition within a table
#[derive(Debug, Clone)]
pub struct Column {
    /// Position in table (0-indexed)
    pub ordinal: ColumnId,
    /// Column name
    pub name: String,
    /// Column type
    pub col_type: ColumnType,
    /// Whether this column allows NULL values
    pub is_nullable: bool,
    /// Whether the column has a DEFAULT expression
    pub has_default: bool,
    /// Whether the column is computed (GENERATED ALWAYS AS / identity)
    pub is_generated: bool,
}

impl Column {
    pub fn new(ordinal: ColumnId, name: impl Into<String>, col_type: ColumnType) -> Self {
        Self {
            ordinal,
            name: name.into(),
            col_type,
            is_nullable: true,
            has_default: false,
            is_generated: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }
}

/// Index definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub oid: u32,
    /// Index name
    pub name: String,
    /// Covered column ordinals, in index order
    pub columns: Vec<ColumnId>,
    /// Whether this is a unique index
    pub is_unique: bool,
    /// Whether this index backs the primary key
    pub is_primary: bool,
    /// NULLs collide with each other in this unique index
    pub nulls_not_distinct: bool,
}

/// Kind of table constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
}

/// Table constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    pub columns: Vec<ColumnId>,
}

/// Foreign key constraint definition
#[derive(Debug, Clone)]
pub struct ForeignKey {
    /// Constraint name (optional)
    pub name: Option<String>,
    /// Column IDs in this table that form the FK
    pub columns: Vec<ColumnId>,
    /// Column names in this table (before resolution)
    pub column_names: Vec<String>,
    /// Referenced table
    pub referenced_table: Identifier,
    /// Referenced column names
    pub referenced_columns: Vec<String>,
    /// Resolved referenced table ID (set after schema is complete)
    pub referenced_table_id: Option<TableId>,
}

/// Reverse edge: a foreign key in another table that points at this one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedBy {
    pub table: TableId,
    pub constraint: Option<String>,
}

/// Complete table definition
#[derive(Debug, Clone)]
pub struct Table {
    /// Qualified table name
    pub name: Identifier,
    /// Table ID within the schema
    pub id: TableId,
    /// Column definitions in ordinal order
    pub columns: Vec<Column>,
    /// Primary key constraint, if declared
    pub primary_key: Option<Constraint>,
    /// Index definitions (the primary key is mirrored here as a unique index)
    pub indexes: Vec<Index>,
    /// Named constraints
    pub constraints: Vec<Constraint>,
    /// Foreign key constraints
    pub foreign_keys: Vec<ForeignKey>,
    /// Foreign keys of other tables that reference this table
    pub referenced_by: Vec<ReferencedBy>,
}

impl Table {
    /// Create a new empty table
    pub fn new(name: Identifier, id: TableId) -> Self {
        Self {
            name,
            id,
            columns: Vec::new(),
            primary_key: None,
            indexes: Vec::new(),
            constraints: Vec::new(),
            foreign_keys: Vec::new(),
            referenced_by: Vec::new(),
        }
    }

    /// Append a column, assigning the next ordinal
    pub fn add_column(&mut self, name: &str, col_type: ColumnType) -> &mut Column {
        let ordinal = ColumnId(self.columns.len() as u16);
        self.columns.push(Column::new(ordinal, name, col_type));
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Get column ID by name
    pub fn get_column_id(&self, name: &str) -> Option<ColumnId> {
        self.get_column(name).map(|c| c.ordinal)
    }

    /// Get column by ID
    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.0 as usize)
    }

    /// Add a unique index over the given columns.
    ///
    /// Declaring the same column set twice keeps the first index.
    pub fn add_unique_index(&mut self, name: String, columns: Vec<ColumnId>, is_primary: bool) {
        if columns.is_empty() {
            return;
        }
        if let Some(existing) = self
            .indexes
            .iter_mut()
            .find(|idx| idx.is_unique && idx.columns == columns)
        {
            existing.is_primary |= is_primary;
            return;
        }
        let oid = self.indexes.len() as u32;
        self.indexes.push(Index {
            oid,
            name,
            columns,
            is_unique: true,
            is_primary,
            nulls_not_distinct: false,
        });
    }

    /// Declare the primary key, mirroring it as a unique index
    pub fn set_primary_key(&mut self, columns: Vec<ColumnId>) {
        if columns.is_empty() {
            return;
        }
        let name = format!("{}_pkey", self.name.name);
        for col in &columns {
            if let Some(column) = self.columns.get_mut(col.0 as usize) {
                column.is_nullable = false;
            }
        }
        self.primary_key = Some(Constraint {
            name: name.clone(),
            kind: ConstraintKind::PrimaryKey,
            columns: columns.clone(),
        });
        self.add_unique_index(name, columns, true);
    }

    /// The table's unique-enforcement set
    pub fn unique_indexes(&self) -> impl Iterator<Item = &Index> {
        self.indexes.iter().filter(|idx| idx.is_unique)
    }

    /// Whether any FK of this table points back at the table itself
    pub fn has_self_reference(&self) -> bool {
        self.foreign_keys
            .iter()
            .any(|fk| fk.referenced_table_id == Some(self.id))
    }
}

/// Complete database schema
#[derive(Debug, Default)]
pub struct Schema {
    /// Map from canonical table name to table ID
    pub tables: AHashMap<String, TableId>,
    /// Tables indexed by TableId
    pub table_defs: Vec<Table>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Get table ID by `schema.name` or bare name (case-insensitive)
    pub fn get_table_id(&self, name: &str) -> Option<TableId> {
        let ident = Identifier::parse(name);
        if let Some(&id) = self.tables.get(&ident.canonical()) {
            return Some(id);
        }
        let qualified = name.contains('.');
        self.table_defs
            .iter()
            .find(|t| {
                t.name.name.eq_ignore_ascii_case(&ident.name)
                    && (!qualified || t.name.schema.eq_ignore_ascii_case(&ident.schema))
            })
            .map(|t| t.id)
    }

    /// Get table by ID
    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.table_defs.get(id.0 as usize)
    }

    /// Get mutable table by ID
    pub fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.table_defs.get_mut(id.0 as usize)
    }

    /// Get table by name
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.get_table_id(name).and_then(|id| self.table(id))
    }

    /// Add a new table, returning its ID
    pub fn add_table(&mut self, mut table: Table) -> TableId {
        let id = TableId(self.table_defs.len() as u32);
        table.id = id;
        table.name.oid.get_or_insert(id.0);
        self.tables.insert(table.name.canonical(), id);
        self.table_defs.push(table);
        id
    }

    /// Resolve all foreign key references to table IDs and fill reverse edges
    pub fn resolve_foreign_keys(&mut self) {
        let mut reverse: Vec<(TableId, ReferencedBy)> = Vec::new();

        for i in 0..self.table_defs.len() {
            let fk_count = self.table_defs[i].foreign_keys.len();
            for j in 0..fk_count {
                let target = self.table_defs[i].foreign_keys[j].referenced_table.canonical();
                let resolved = self.get_table_id(&target);
                let table = &mut self.table_defs[i];
                let fk = &mut table.foreign_keys[j];
                fk.referenced_table_id = resolved;
                if let Some(parent) = resolved {
                    reverse.push((
                        parent,
                        ReferencedBy {
                            table: table.id,
                            constraint: fk.name.clone(),
                        },
                    ));
                }
            }
        }

        for table in &mut self.table_defs {
            table.referenced_by.clear();
        }
        for (parent, edge) in reverse {
            if let Some(table) = self.table_mut(parent) {
                table.referenced_by.push(edge);
            }
        }
    }

    /// Get the number of tables
    pub fn len(&self) -> usize {
        self.table_defs.len()
    }

    /// Check if schema is empty
    pub fn is_empty(&self) -> bool {
        self.table_defs.is_empty()
    }

    /// Iterate over all tables
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.table_defs.iter()
    }
}
