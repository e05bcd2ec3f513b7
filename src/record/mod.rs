//! Row models: sparse partial records and full generated records.
//!
//! Values are `Option<String>`: `None` is SQL NULL, everything else is the
//! literal text of the value.

use crate::schema::{ColumnId, Table};
use serde::Serialize;

/// A column value; `None` means NULL
pub type Value = Option<String>;

/// Explicit values for a subset of a table's columns, sorted by ordinal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialRecord {
    columns: Vec<ColumnId>,
    values: Vec<Value>,
}

impl PartialRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from unordered `(column, value)` pairs; a repeated column keeps
    /// its last value
    pub fn from_pairs(pairs: impl IntoIterator<Item = (ColumnId, Value)>) -> Self {
        let mut record = Self::new();
        for (column, value) in pairs {
            record.set(column, value);
        }
        record
    }

    /// Builder-style [`PartialRecord::set`]
    pub fn with(mut self, column: ColumnId, value: impl Into<Value>) -> Self {
        self.set(column, value.into());
        self
    }

    /// Set a column, keeping ordinals sorted
    pub fn set(&mut self, column: ColumnId, value: Value) {
        match self.columns.binary_search(&column) {
            Ok(pos) => self.values[pos] = value,
            Err(pos) => {
                self.columns.insert(pos, column);
                self.values.insert(pos, value);
            }
        }
    }

    pub fn get(&self, column: ColumnId) -> Option<&Value> {
        self.columns
            .binary_search(&column)
            .ok()
            .map(|pos| &self.values[pos])
    }

    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColumnId, &Value)> {
        self.columns.iter().copied().zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whether the two records share no column (linear scan of both sorted lists)
    pub fn is_disjoint(&self, other: &PartialRecord) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.columns.len() && j < other.columns.len() {
            match self.columns[i].cmp(&other.columns[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => return false,
            }
        }
        true
    }

    /// Merge a disjoint record into this one, keeping ordinals sorted
    fn absorb(&mut self, other: PartialRecord) {
        let mut columns = Vec::with_capacity(self.columns.len() + other.columns.len());
        let mut values = Vec::with_capacity(columns.capacity());
        let mut left = self
            .columns
            .drain(..)
            .zip(self.values.drain(..))
            .peekable();
        let mut right = other.columns.into_iter().zip(other.values).peekable();

        loop {
            let take_left = match (left.peek(), right.peek()) {
                (Some((l, _)), Some((r, _))) => l < r,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let next = if take_left { left.next() } else { right.next() };
            if let Some((column, value)) = next {
                columns.push(column);
                values.push(value);
            }
        }

        drop(left);
        self.columns = columns;
        self.values = values;
    }
}

/// Partial records combined by first-fit merging of disjoint column sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialRecords {
    entries: Vec<PartialRecord>,
}

impl PartialRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`merge_add`]
    pub fn merge_add(&mut self, record: PartialRecord) {
        merge_add(self, record);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PartialRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<PartialRecord> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a PartialRecords {
    type Item = &'a PartialRecord;
    type IntoIter = std::slice::Iter<'a, PartialRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Fold `record` into the first entry whose columns are disjoint from it,
/// or append it as a new entry.
///
/// First fit, not a global minimum: only the target entry is guaranteed to
/// be disjoint from the incoming record.
pub fn merge_add(partials: &mut PartialRecords, record: PartialRecord) {
    if record.is_empty() {
        return;
    }
    match partials
        .entries
        .iter_mut()
        .find(|entry| entry.is_disjoint(&record))
    {
        Some(entry) => entry.absorb(record),
        None => partials.entries.push(record),
    }
}

/// A full generated row, sorted by column ordinal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    columns: Vec<ColumnId>,
    values: Vec<Value>,
}

impl Record {
    /// Build from `(column, value)` pairs in any order
    pub fn from_pairs(mut pairs: Vec<(ColumnId, Value)>) -> Self {
        pairs.sort_by_key(|(column, _)| *column);
        let (columns, values) = pairs.into_iter().unzip();
        Self { columns, values }
    }

    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, column: ColumnId) -> Option<&Value> {
        self.columns
            .binary_search(&column)
            .ok()
            .map(|pos| &self.values[pos])
    }
}

/// Display metadata for an emitted column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordColumn {
    pub ordinal: ColumnId,
    pub name: String,
}

/// All generated rows of one table, with the emitted column list
#[derive(Debug, Clone, Default)]
pub struct Records {
    columns: Vec<RecordColumn>,
    rows: Vec<Record>,
}

impl Records {
    /// Empty record set emitting the given columns of `table`
    pub fn new(table: &Table, emitted: &[ColumnId]) -> Self {
        let columns = emitted
            .iter()
            .filter_map(|&id| table.column(id))
            .map(|c| RecordColumn {
                ordinal: c.ordinal,
                name: c.name.clone(),
            })
            .collect();
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, record: Record) {
        self.rows.push(record);
    }

    pub fn columns(&self) -> &[RecordColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row values in column-list order, ready for a sink
    pub fn row_values<'a>(&'a self, row: &'a Record) -> impl Iterator<Item = &'a Value> + 'a {
        static NULL: Value = None;
        self.columns
            .iter()
            .map(move |c| row.get(c.ordinal).unwrap_or(&NULL))
    }
}
