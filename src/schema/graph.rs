//! Schema dependency graph for FK-aware insertion ordering.
//!
//! Provides:
//! - Dependency graph construction from schema FK relationships
//! - Deterministic topological sorting (parents before children)
//! - Cycle detection; a cycle makes ordering impossible

use super::{Schema, TableId};
use crate::error::Error;
use std::collections::{BTreeMap, BTreeSet};

/// Sort table names so that every table comes after the tables it references.
///
/// `graph` maps a table name to the names it references through foreign keys.
/// Self-references are ignored and so are references to names that are not
/// keys of `graph`. Ties are broken by name, ascending.
///
/// Any cycle of two or more tables fails the whole sort; no partial order is
/// returned.
pub fn topological_sort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Error> {
    // Unresolved outgoing references per table
    let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
    // Reverse edges: referenced table -> tables waiting on it
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (table, refs) in graph {
        let mut count = 0;
        for parent in refs {
            if parent == table || !graph.contains_key(parent) {
                continue;
            }
            count += 1;
            dependents
                .entry(parent.as_str())
                .or_default()
                .push(table.as_str());
        }
        pending.insert(table.as_str(), count);
    }

    let mut ready: BTreeSet<&str> = pending
        .iter()
        .filter(|(_, &count)| count == 0)
        .map(|(&name, _)| name)
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(table) = ready.pop_first() {
        order.push(table.to_string());
        pending.remove(table);

        if let Some(children) = dependents.get(table) {
            for &child in children {
                if let Some(count) = pending.get_mut(child) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(child);
                    }
                }
            }
        }
    }

    if !pending.is_empty() {
        return Err(Error::Cycle {
            tables: pending.keys().map(|name| name.to_string()).collect(),
        });
    }

    Ok(order)
}

/// Schema dependency graph built from foreign key relationships.
///
/// - A parent is a table referenced by another table's FK
/// - A child is a table that has an FK referencing another table
#[derive(Debug)]
pub struct SchemaGraph<'a> {
    schema: &'a Schema,
    /// For each table, list of parent tables (tables this table references via FK)
    pub parents: Vec<Vec<TableId>>,
    /// For each table, list of child tables (tables that reference this table via FK)
    pub children: Vec<Vec<TableId>>,
}

impl<'a> SchemaGraph<'a> {
    /// Build a dependency graph from a schema
    pub fn from_schema(schema: &'a Schema) -> Self {
        let n = schema.len();
        let mut parents: Vec<Vec<TableId>> = vec![Vec::new(); n];
        let mut children: Vec<Vec<TableId>> = vec![Vec::new(); n];

        for table in schema.iter() {
            let child_id = table.id;

            for fk in &table.foreign_keys {
                let Some(parent_id) = fk.referenced_table_id else {
                    continue;
                };
                // Self-references never block insertion
                if parent_id == child_id {
                    continue;
                }
                if !parents[child_id.0 as usize].contains(&parent_id) {
                    parents[child_id.0 as usize].push(parent_id);
                }
                if !children[parent_id.0 as usize].contains(&child_id) {
                    children[parent_id.0 as usize].push(child_id);
                }
            }
        }

        Self {
            schema,
            parents,
            children,
        }
    }

    /// Get the number of tables in the graph
    pub fn len(&self) -> usize {
        self.schema.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    /// Canonical-name adjacency map consumed by [`topological_sort`]
    pub fn dependency_map(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.schema
            .iter()
            .map(|table| {
                let refs = self.parents[table.id.0 as usize]
                    .iter()
                    .filter_map(|&p| self.schema.table(p))
                    .map(|p| p.name.canonical())
                    .collect();
                (table.name.canonical(), refs)
            })
            .collect()
    }

    /// Tables in insertion order (parents before children)
    pub fn insertion_order(&self) -> Result<Vec<TableId>, Error> {
        let names = topological_sort(&self.dependency_map())?;
        Ok(names
            .iter()
            .filter_map(|name| self.schema.tables.get(name).copied())
            .collect())
    }

    /// Tables with self-referential FKs
    pub fn self_referential_tables(&self) -> Vec<TableId> {
        self.schema
            .iter()
            .filter(|t| t.has_self_reference())
            .map(|t| t.id)
            .collect()
    }
}
