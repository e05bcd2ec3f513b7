//! DDL parsing for schema extraction.
//!
//! Parses PostgreSQL/MySQL-style statements to extract:
//! - Tables with column types, nullability, defaults and generated columns
//! - Primary key, unique and foreign key constraints (inline or table-level)
//! - Indexes from CREATE INDEX, including `NULLS NOT DISTINCT`
//! - Enum, composite, range and domain types from CREATE TYPE / CREATE DOMAIN

use super::{
    ColumnId, ColumnType, Constraint, ConstraintKind, ForeignKey, Identifier, Index,
    Schema, Table, TableId, TypeKind, CATALOG_SCHEMAS, DEFAULT_SCHEMA,
};
use ahash::AHashMap;
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

/// A single identifier: `name`, `"name"`, `` `name` `` or `[name]`
const IDENT: &str = r#"(?:`[^`]+`|"[^"]+"|\[[^\]]+\]|[\w$]+)"#;

/// Optionally schema-qualified identifier
static QUALIFIED: Lazy<String> = Lazy::new(|| format!(r"{IDENT}(?:\s*\.\s*{IDENT})?"));

static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^CREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:GLOBAL|LOCAL)\s+)?(?:TEMP\s+|TEMPORARY\s+|UNLOGGED\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?({})",
        *QUALIFIED
    ))
    .unwrap()
});

static ALTER_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?({})\s+(.*)$",
        *QUALIFIED
    ))
    .unwrap()
});

/// CREATE [UNIQUE] INDEX [name] ON table [USING method] (
static CREATE_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^CREATE\s+(UNIQUE\s+)?(?:CLUSTERED\s+|NONCLUSTERED\s+)?INDEX\s+(?:CONCURRENTLY\s+)?(?:IF\s+NOT\s+EXISTS\s+)?(?:({IDENT})\s+)?ON\s+(?:ONLY\s+)?({})\s*(?:USING\s+\w+\s*)?\(",
        *QUALIFIED
    ))
    .unwrap()
});

/// CREATE TYPE name AS [ENUM | RANGE] (
static CREATE_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^CREATE\s+TYPE\s+({})\s+AS\s*(ENUM|RANGE)?\s*\(",
        *QUALIFIED
    ))
    .unwrap()
});

static CREATE_DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?is)^CREATE\s+DOMAIN\s+({})", *QUALIFIED)).unwrap()
});

static COLUMN_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?s)^\s*({IDENT})\s+")).unwrap());

/// Type name with optional modifiers, time zone clause, `unsigned` and array suffix
static TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(double\s+precision|national\s+character\s+varying|national\s+character|character\s+varying|bit\s+varying|{})(\s*\(\s*\d+\s*(?:,\s*-?\d+\s*)?\))?(\s+with(?:out)?\s+time\s+zone)?(\s+unsigned)?((?:\s*\[\s*\d*\s*\])*)",
        *QUALIFIED
    ))
    .unwrap()
});

/// MySQL inline `enum('a','b')` / `set('a','b')`
static INLINE_ENUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:enum|set)\s*\(").unwrap());

static TYPE_ARGS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)(?:\s*,\s*(-?\d+))?").unwrap());

/// Table-level constraint or index entry in a CREATE TABLE body
static TABLE_CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:CONSTRAINT|PRIMARY\s+KEY|FOREIGN\s+KEY|UNIQUE|KEY|INDEX|FULLTEXT|SPATIAL|CHECK|EXCLUDE|LIKE)\b",
    )
    .unwrap()
});

static CONSTRAINT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?is)^CONSTRAINT\s+({IDENT})\s+(.*)$")).unwrap());

static PRIMARY_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^PRIMARY\s+KEY\s*(?:CLUSTERED\s+|NONCLUSTERED\s+)?\(([^)]+)\)").unwrap()
});

static UNIQUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^UNIQUE(?:\s+(?:KEY|INDEX))?(?:\s+(?:CLUSTERED|NONCLUSTERED))?(?:\s+({IDENT}))??\s*(NULLS\s+NOT\s+DISTINCT\s*)?\(([^)]+)\)"
    ))
    .unwrap()
});

static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^FOREIGN\s+KEY\s*(?:{IDENT}\s*)?\(([^)]+)\)\s*REFERENCES\s+({})\s*(?:\(([^)]+)\))?",
        *QUALIFIED
    ))
    .unwrap()
});

static INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^(?:KEY|INDEX)\s+(?:({IDENT})\s*)?(?:USING\s+\w+\s*)?\(([^)]+)\)"
    ))
    .unwrap()
});

static CHECK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^CHECK\b").unwrap());

static NOT_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").unwrap());

static DEFAULT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bDEFAULT\b|\bAUTO_INCREMENT\b|\bAUTOINCREMENT\b|\bGENERATED\s+BY\s+DEFAULT\b")
        .unwrap()
});

/// Columns the database computes and that reject explicit values
static GENERATED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bGENERATED\s+ALWAYS\b|(?:^|\s)AS\s*\(|\bIDENTITY\s*(?:\(|$|\s)").unwrap()
});

static BY_DEFAULT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bGENERATED\s+BY\s+DEFAULT\b").unwrap());

static INLINE_PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").unwrap());

static INLINE_UNIQUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bUNIQUE\b").unwrap());

static NULLS_NOT_DISTINCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bNULLS\s+NOT\s+DISTINCT\b").unwrap());

static REFERENCES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)\bREFERENCES\s+({})\s*(?:\(([^)]+)\))?",
        *QUALIFIED
    ))
    .unwrap()
});

static ALTER_ADD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)^ADD\s+(.*)$").unwrap());

static ADD_COLUMN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^COLUMN\s+(?:IF\s+NOT\s+EXISTS\s+)?").unwrap());

static ALTER_COLUMN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^(?:ALTER|MODIFY)\s+(?:COLUMN\s+)?({IDENT})\s+(SET\s+NOT\s+NULL|DROP\s+NOT\s+NULL|SET\s+DEFAULT)"
    ))
    .unwrap()
});

/// Types whose single modifier is a character or bit length
const LENGTH_TYPES: &[&str] = &[
    "varchar", "char", "bpchar", "nvarchar", "nchar", "bit", "varbit", "binary", "varbinary",
];

/// Types whose modifiers are precision and scale
const DECIMAL_TYPES: &[&str] = &["numeric", "decimal"];

/// Types with an implicit sequence default
const SERIAL_TYPES: &[&str] = &[
    "serial", "serial2", "serial4", "serial8", "smallserial", "bigserial",
];

/// Builder for constructing schema from DDL statements
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
    /// User-declared types by canonical name
    user_types: AHashMap<String, TypeKind>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every statement of a DDL script, returning how many were understood
    pub fn parse_sql(&mut self, sql: &str) -> usize {
        split_statements(sql)
            .iter()
            .filter(|stmt| self.parse_statement(stmt))
            .count()
    }

    /// Parse one statement; returns false for statements that carry no schema
    pub fn parse_statement(&mut self, stmt: &str) -> bool {
        let stmt = stmt.trim();
        if CREATE_TABLE_RE.is_match(stmt) {
            self.parse_create_table(stmt).is_some()
        } else if CREATE_INDEX_RE.is_match(stmt) {
            self.parse_create_index(stmt).is_some()
        } else if CREATE_TYPE_RE.is_match(stmt) {
            self.parse_create_type(stmt).is_some()
        } else if CREATE_DOMAIN_RE.is_match(stmt) {
            self.parse_create_domain(stmt).is_some()
        } else if ALTER_TABLE_RE.is_match(stmt) {
            self.parse_alter_table(stmt).is_some()
        } else {
            false
        }
    }

    /// Parse a CREATE TABLE statement and add to schema
    pub fn parse_create_table(&mut self, stmt: &str) -> Option<TableId> {
        let caps = CREATE_TABLE_RE.captures(stmt)?;
        let name_match = caps.get(1)?;
        let name = parse_qualified_name(name_match.as_str());

        if let Some(id) = self.schema.get_table_id(&name.canonical()) {
            return Some(id);
        }

        let rest = &stmt[name_match.end()..];
        if !rest.trim_start().starts_with('(') {
            // CREATE TABLE ... AS / PARTITION OF
            return None;
        }
        let (body, _) = extract_parenthesized(rest)?;

        let mut table = Table::new(name, TableId(0));
        let parts = split_table_body(&body);
        let (constraints, columns): (Vec<&String>, Vec<&String>) = parts
            .iter()
            .filter(|p| !p.is_empty())
            .partition(|p| TABLE_CONSTRAINT_RE.is_match(p));

        for def in columns {
            add_column_def(&mut table, def, &self.user_types);
        }
        for def in constraints {
            apply_table_constraint(&mut table, def);
        }

        Some(self.schema.add_table(table))
    }

    /// Parse an ALTER TABLE statement and update the existing table
    pub fn parse_alter_table(&mut self, stmt: &str) -> Option<TableId> {
        let caps = ALTER_TABLE_RE.captures(stmt)?;
        let name = parse_qualified_name(caps.get(1)?.as_str());
        let table_id = self.schema.get_table_id(&name.canonical())?;
        let actions = split_table_body(caps.get(2)?.as_str());
        let table = self.schema.table_mut(table_id)?;

        for action in &actions {
            if let Some(add) = ALTER_ADD_RE.captures(action) {
                let def = add.get(1).map_or("", |m| m.as_str());
                if TABLE_CONSTRAINT_RE.is_match(def) {
                    apply_table_constraint(table, def);
                } else {
                    let def = ADD_COLUMN_RE.replace(def, "");
                    add_column_def(table, &def, &self.user_types);
                }
            } else if let Some(alter) = ALTER_COLUMN_RE.captures(action) {
                let column = unquote_ident(&alter[1]);
                let change = alter[2].to_uppercase();
                if let Some(col) = table
                    .columns
                    .iter_mut()
                    .find(|c| c.name.eq_ignore_ascii_case(&column))
                {
                    if change.starts_with("SET NOT") {
                        col.is_nullable = false;
                    } else if change.starts_with("DROP") {
                        col.is_nullable = true;
                    } else {
                        col.has_default = true;
                    }
                }
            }
        }

        Some(table_id)
    }

    /// Parse a CREATE INDEX statement and add to the appropriate table
    pub fn parse_create_index(&mut self, stmt: &str) -> Option<TableId> {
        let caps = CREATE_INDEX_RE.captures(stmt)?;
        let is_unique = caps.get(1).is_some();
        let index_name = caps.get(2).map(|m| unquote_ident(m.as_str()));
        let table_name = parse_qualified_name(caps.get(3)?.as_str());

        let open = caps.get(0)?.end() - 1;
        let (columns_str, end) = extract_parenthesized(&stmt[open..])?;
        let nulls_not_distinct = NULLS_NOT_DISTINCT_RE.is_match(&stmt[open + end..]);

        let table_id = self.schema.get_table_id(&table_name.canonical())?;
        let table = self.schema.table_mut(table_id)?;

        let names = parse_column_list(&columns_str);
        // Expression indexes cannot be tracked by column values
        let Some(columns) = resolve_columns(table, &names) else {
            return Some(table_id);
        };
        let name = index_name.unwrap_or_else(|| {
            let suffix = if is_unique { "key" } else { "idx" };
            format!("{}_{}_{}", table.name.name, names.join("_"), suffix)
        });

        if is_unique {
            add_unique(table, name, columns, nulls_not_distinct);
        } else {
            add_plain_index(table, name, columns);
        }

        Some(table_id)
    }

    /// Parse CREATE TYPE, recording enums with their labels
    pub fn parse_create_type(&mut self, stmt: &str) -> Option<Identifier> {
        let caps = CREATE_TYPE_RE.captures(stmt)?;
        let name = parse_qualified_name(caps.get(1)?.as_str());
        let open = caps.get(0)?.end() - 1;
        let (body, _) = extract_parenthesized(&stmt[open..])?;

        let kind = match caps.get(2).map(|m| m.as_str().to_uppercase()) {
            Some(k) if k == "ENUM" => TypeKind::Enum(parse_labels(&body)),
            Some(_) => TypeKind::Range,
            None => TypeKind::Composite,
        };
        self.user_types
            .insert(type_key(&name.schema, &name.name.to_lowercase()), kind);
        Some(name)
    }

    /// Parse CREATE DOMAIN; columns of the domain type get no built-in values
    pub fn parse_create_domain(&mut self, stmt: &str) -> Option<Identifier> {
        let caps = CREATE_DOMAIN_RE.captures(stmt)?;
        let name = parse_qualified_name(caps.get(1)?.as_str());
        self.user_types.insert(
            type_key(&name.schema, &name.name.to_lowercase()),
            TypeKind::Domain,
        );
        Some(name)
    }

    /// Finalize the schema, resolving all FK references
    pub fn build(mut self) -> Schema {
        self.schema.resolve_foreign_keys();
        self.schema
    }

    /// Get current schema (for inspection during building)
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Read a DDL file and build its schema
pub fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    let sql = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file {}", path.display()))?;
    let mut builder = SchemaBuilder::new();
    builder.parse_sql(&sql);
    let schema = builder.build();
    if schema.is_empty() {
        anyhow::bail!("No CREATE TABLE statements found in {}", path.display());
    }
    Ok(schema)
}

fn type_key(schema: &str, name: &str) -> String {
    format!("{}.{}", schema, name)
}

/// Parse a column definition and its inline constraints into `table`
fn add_column_def(table: &mut Table, def: &str, user_types: &AHashMap<String, TypeKind>) -> bool {
    let Some(caps) = COLUMN_NAME_RE.captures(def) else {
        return false;
    };
    let (Some(all), Some(name)) = (caps.get(0), caps.get(1)) else {
        return false;
    };
    let name = unquote_ident(name.as_str());
    if table.get_column(&name).is_some() {
        return false;
    }
    let rest = &def[all.end()..];
    let Some((col_type, consumed)) =
        parse_column_type(rest, &table.name, &name, user_types)
    else {
        return false;
    };
    let options = &rest[consumed..];
    let serial = SERIAL_TYPES.contains(&col_type.name.as_str());

    let column = table.add_column(&name, col_type);
    column.is_nullable = !NOT_NULL_RE.is_match(options) && !serial;
    column.is_generated = GENERATED_RE.is_match(options) && !BY_DEFAULT_RE.is_match(options);
    column.has_default = serial || DEFAULT_RE.is_match(options);
    let ordinal = column.ordinal;

    if INLINE_PRIMARY_KEY_RE.is_match(options) {
        table.set_primary_key(vec![ordinal]);
    } else if INLINE_UNIQUE_RE.is_match(options) {
        let index_name = format!("{}_{}_key", table.name.name, name);
        add_unique(
            table,
            index_name,
            vec![ordinal],
            NULLS_NOT_DISTINCT_RE.is_match(options),
        );
    }

    if let Some(refs) = REFERENCES_RE.captures(options) {
        let referenced = parse_qualified_name(refs.get(1).map_or("", |m| m.as_str()));
        table.foreign_keys.push(ForeignKey {
            name: None,
            columns: vec![ordinal],
            column_names: vec![name],
            referenced_table: referenced,
            referenced_columns: refs
                .get(2)
                .map(|m| parse_column_list(m.as_str()))
                .unwrap_or_default(),
            referenced_table_id: None,
        });
    }

    true
}

/// Parse the type at the start of `rest`; returns the type and bytes consumed
fn parse_column_type(
    rest: &str,
    table: &Identifier,
    column: &str,
    user_types: &AHashMap<String, TypeKind>,
) -> Option<(ColumnType, usize)> {
    if let Some(m) = INLINE_ENUM_RE.find(rest) {
        let open = m.end() - 1;
        let (body, end) = extract_parenthesized(&rest[open..])?;
        let name = format!("{}_{}_enum", table.name, column);
        let col_type = ColumnType::enumeration(&table.schema, &name, parse_labels(&body));
        return Some((col_type, open + end));
    }

    let caps = TYPE_RE.captures(rest)?;
    let raw = caps.get(1)?.as_str();
    let with_tz = caps
        .get(3)
        .map(|m| !m.as_str().to_lowercase().contains("without"));
    let is_array = caps.get(5).is_some_and(|m| !m.as_str().trim().is_empty());

    let mut parts = split_qualified(raw);
    let base = parts.pop().unwrap_or_default();
    let type_schema = parts.pop();
    let name = normalize_type_name(&base, with_tz);

    let schema = type_schema.clone().unwrap_or_else(|| DEFAULT_SCHEMA.to_string());
    let mut col_type = match user_types.get(&type_key(&schema, &name)) {
        Some(kind) => ColumnType {
            name: name.clone(),
            schema,
            kind: kind.clone(),
            max_length: None,
            precision: None,
            scale: None,
        },
        None => match type_schema {
            Some(s) if !CATALOG_SCHEMAS.contains(&s.as_str()) => ColumnType {
                name: name.clone(),
                schema: s,
                kind: TypeKind::Base,
                max_length: None,
                precision: None,
                scale: None,
            },
            _ => ColumnType::base(&name),
        },
    };

    if let Some(args) = caps.get(2).and_then(|m| TYPE_ARGS_RE.captures(m.as_str())) {
        let first = args.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
        let second = args.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        if LENGTH_TYPES.contains(&name.as_str()) {
            col_type.max_length = first;
        } else if DECIMAL_TYPES.contains(&name.as_str()) {
            col_type.precision = first;
            col_type.scale = second;
        }
    } else if matches!(name.as_str(), "char" | "bpchar" | "nchar" | "bit") {
        // A bare char/bit has length 1
        col_type.max_length = Some(1);
    }

    if is_array {
        col_type.kind = TypeKind::Array;
    }

    Some((col_type, caps.get(0)?.end()))
}

/// Lower-case, collapse whitespace and map SQL-standard spellings to catalog names
fn normalize_type_name(raw: &str, with_tz: Option<bool>) -> String {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let name = match name.as_str() {
        "character varying" | "national character varying" => "varchar".to_string(),
        "character" | "national character" => "char".to_string(),
        "bit varying" => "varbit".to_string(),
        _ => name,
    };
    match (name.as_str(), with_tz) {
        ("timestamp", Some(true)) => "timestamptz".to_string(),
        ("time", Some(true)) => "timetz".to_string(),
        _ => name,
    }
}

/// Apply a table-level constraint or index definition
fn apply_table_constraint(table: &mut Table, def: &str) -> bool {
    let (constraint_name, body) = match CONSTRAINT_NAME_RE.captures(def) {
        Some(caps) => (
            caps.get(1).map(|m| unquote_ident(m.as_str())),
            caps.get(2).map_or("", |m| m.as_str()),
        ),
        None => (None, def),
    };

    if let Some(caps) = PRIMARY_KEY_RE.captures(body) {
        let names = parse_column_list(caps.get(1).map_or("", |m| m.as_str()));
        let Some(columns) = resolve_columns(table, &names) else {
            return false;
        };
        table.set_primary_key(columns);
        if let (Some(name), Some(pk)) = (constraint_name, table.primary_key.as_mut()) {
            pk.name = name;
        }
        return true;
    }

    if let Some(caps) = UNIQUE_RE.captures(body) {
        let names = parse_column_list(caps.get(3).map_or("", |m| m.as_str()));
        let Some(columns) = resolve_columns(table, &names) else {
            return false;
        };
        let name = constraint_name
            .or_else(|| caps.get(1).map(|m| unquote_ident(m.as_str())))
            .unwrap_or_else(|| format!("{}_{}_key", table.name.name, names.join("_")));
        table.constraints.push(Constraint {
            name: name.clone(),
            kind: ConstraintKind::Unique,
            columns: columns.clone(),
        });
        add_unique(table, name, columns, caps.get(2).is_some());
        return true;
    }

    if let Some(caps) = FOREIGN_KEY_RE.captures(body) {
        let column_names = parse_column_list(caps.get(1).map_or("", |m| m.as_str()));
        let columns: Vec<ColumnId> = column_names
            .iter()
            .filter_map(|name| table.get_column_id(name))
            .collect();
        if let Some(name) = &constraint_name {
            table.constraints.push(Constraint {
                name: name.clone(),
                kind: ConstraintKind::ForeignKey,
                columns: columns.clone(),
            });
        }
        table.foreign_keys.push(ForeignKey {
            name: constraint_name,
            columns,
            column_names,
            referenced_table: parse_qualified_name(caps.get(2).map_or("", |m| m.as_str())),
            referenced_columns: caps
                .get(3)
                .map(|m| parse_column_list(m.as_str()))
                .unwrap_or_default(),
            referenced_table_id: None,
        });
        return true;
    }

    if let Some(caps) = INDEX_RE.captures(body) {
        let names = parse_column_list(caps.get(2).map_or("", |m| m.as_str()));
        if let Some(columns) = resolve_columns(table, &names) {
            let name = caps
                .get(1)
                .map(|m| unquote_ident(m.as_str()))
                .unwrap_or_else(|| format!("{}_{}_idx", table.name.name, names.join("_")));
            add_plain_index(table, name, columns);
            return true;
        }
        return false;
    }

    if CHECK_RE.is_match(body) {
        let name = constraint_name
            .unwrap_or_else(|| format!("{}_check{}", table.name.name, table.constraints.len()));
        table.constraints.push(Constraint {
            name,
            kind: ConstraintKind::Check,
            columns: Vec::new(),
        });
        return true;
    }

    false
}

fn add_unique(table: &mut Table, name: String, columns: Vec<ColumnId>, nulls_not_distinct: bool) {
    table.add_unique_index(name, columns.clone(), false);
    if nulls_not_distinct {
        if let Some(index) = table
            .indexes
            .iter_mut()
            .find(|idx| idx.is_unique && idx.columns == columns)
        {
            index.nulls_not_distinct = true;
        }
    }
}

fn add_plain_index(table: &mut Table, name: String, columns: Vec<ColumnId>) {
    let oid = table.indexes.len() as u32;
    table.indexes.push(Index {
        oid,
        name,
        columns,
        is_unique: false,
        is_primary: false,
        nulls_not_distinct: false,
    });
}

/// Map names to ordinals; `None` if any name is not a column of `table`
fn resolve_columns(table: &Table, names: &[String]) -> Option<Vec<ColumnId>> {
    if names.is_empty() {
        return None;
    }
    names.iter().map(|name| table.get_column_id(name)).collect()
}

/// Extract the text between the first `(` and its matching `)`, plus the
/// byte offset just past the closing paren
fn extract_parenthesized(stmt: &str) -> Option<(String, usize)> {
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, b) in stmt.bytes().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if b == b'\\' && in_string {
            escape_next = true;
            continue;
        }

        if b == b'\'' {
            in_string = !in_string;
            continue;
        }

        if in_string {
            continue;
        }

        if b == b'(' {
            if depth == 0 {
                start = Some(i + 1);
            }
            depth += 1;
        } else if b == b')' {
            depth -= 1;
            if depth == 0 {
                if let Some(s) = start {
                    return Some((stmt[s..i].to_string(), i + 1));
                }
            }
        }
    }

    None
}

/// Split table body by commas, respecting nested parentheses and strings
pub fn split_table_body(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for ch in body.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            current.push(ch);
            escape_next = true;
            continue;
        }

        if ch == '\'' {
            in_string = !in_string;
            current.push(ch);
            continue;
        }

        if in_string {
            current.push(ch);
            continue;
        }

        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Split a DDL script into statements on `;`, skipping comments and
/// ignoring semicolons inside quotes and dollar-quoted bodies
pub fn split_statements(sql: &str) -> Vec<String> {
    let chars: Vec<char> = sql.chars().collect();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let next = chars.get(i + 1).copied();
        match ch {
            '-' if next == Some('-') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                current.push('\n');
            }
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                current.push('\n');
            }
            '/' if next == Some('*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
                current.push(' ');
                continue;
            }
            '\'' | '"' | '`' => {
                current.push(ch);
                i += 1;
                while i < chars.len() {
                    let c = chars[i];
                    current.push(c);
                    if c == '\\' && ch == '\'' {
                        if let Some(&escaped) = chars.get(i + 1) {
                            current.push(escaped);
                            i += 1;
                        }
                    } else if c == ch {
                        break;
                    }
                    i += 1;
                }
            }
            '$' => {
                let mut j = i + 1;
                while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                    j += 1;
                }
                if chars.get(j) == Some(&'$') {
                    let tag: String = chars[i..=j].iter().collect();
                    current.push_str(&tag);
                    i = j + 1;
                    let tag_chars: Vec<char> = tag.chars().collect();
                    while i < chars.len() && !chars[i..].starts_with(&tag_chars) {
                        current.push(chars[i]);
                        i += 1;
                    }
                    if i < chars.len() {
                        current.push_str(&tag);
                        i += tag_chars.len();
                    }
                    continue;
                }
                current.push(ch);
            }
            ';' => {
                let stmt = current.trim();
                if !stmt.is_empty() {
                    statements.push(stmt.to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
        i += 1;
    }

    let stmt = current.trim();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }
    statements
}

/// Parse a comma-separated column list, stripping quotes, sort order and
/// MySQL prefix lengths
pub fn parse_column_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(unquote_ident)
        .filter(|c| !c.is_empty())
        .collect()
}

/// First identifier of `s` without its quoting
fn unquote_ident(s: &str) -> String {
    let s = s.trim();
    let close = match s.chars().next() {
        Some('`') => '`',
        Some('"') => '"',
        Some('[') => ']',
        _ => {
            return s
                .split(|c: char| c.is_whitespace() || c == '(')
                .next()
                .unwrap_or("")
                .to_string();
        }
    };
    let inner = &s[1..];
    inner.split(close).next().unwrap_or("").to_string()
}

/// Split a possibly quoted `schema.name` on dots outside quotes
fn split_qualified(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for ch in s.chars() {
        match (quote, ch) {
            (None, '"' | '`') => quote = Some(ch),
            (None, '[') => quote = Some(']'),
            (Some(q), c) if c == q => quote = None,
            (None, '.') => parts.push(std::mem::take(&mut current).trim().to_string()),
            (None, c) if c.is_whitespace() && current.trim().is_empty() => {}
            _ => current.push(ch),
        }
    }
    parts.push(current.trim().to_string());
    parts
}

/// Parse `name` or `schema.name` into an identifier in the default schema
pub fn parse_qualified_name(s: &str) -> Identifier {
    let mut parts = split_qualified(s);
    let name = parts.pop().unwrap_or_default();
    match parts.pop() {
        Some(schema) => Identifier::new(schema, name),
        None => Identifier::new(DEFAULT_SCHEMA, name),
    }
}

/// Parse quoted enum labels: `'a', 'it''s'`
fn parse_labels(body: &str) -> Vec<String> {
    let mut labels = Vec::new();
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\'' {
            continue;
        }
        let mut label = String::new();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    label.push('\'');
                    chars.next();
                    continue;
                }
                break;
            }
            label.push(c);
        }
        labels.push(label);
    }
    labels
}
