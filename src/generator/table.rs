//! Per-table record generation under unique-index constraints.

use crate::domain::ValueDomain;
use crate::error::Error;
use crate::record::{PartialRecord, Record, Records, Value};
use crate::schema::{ColumnId, Table};
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeMap;
use tracing::debug;

/// Default cap on rows per table
pub const DEFAULT_MAX_ROWS: usize = 1000;

/// Default number of draws from an unbounded domain before giving up on a value
pub const DEFAULT_MAX_DRAWS: usize = 10_000;

/// Seen composite keys of one unique index
#[derive(Debug)]
struct UniqueTracker {
    name: String,
    columns: Vec<ColumnId>,
    nulls_not_distinct: bool,
    seen: AHashSet<String>,
}

impl UniqueTracker {
    /// Composite key of `row`, or `None` when the index is not fully populated
    /// or the key holds a NULL that does not take part in uniqueness
    fn key(&self, row: &AHashMap<ColumnId, Value>) -> Option<String> {
        let mut key = String::new();
        for (i, column) in self.columns.iter().enumerate() {
            let value = row.get(column)?;
            if i > 0 {
                key.push(',');
            }
            match value {
                Some(v) => escape_into(&mut key, v),
                None if self.nulls_not_distinct => key.push_str("\\N"),
                None => return None,
            }
        }
        Some(key)
    }

    fn collides(&self, row: &AHashMap<ColumnId, Value>) -> bool {
        self.key(row).is_some_and(|key| self.seen.contains(&key))
    }
}

/// Escape `\` and the separator so distinct tuples never share a key
fn escape_into(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            _ => out.push(ch),
        }
    }
}

/// Outcome of completing one row
enum RowOutcome {
    Complete(AHashMap<ColumnId, Value>),
    /// The seed's explicit values already collide on a unique index
    Conflict(String),
}

/// Summary of a finished table session
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TableStats {
    /// Seed rows dropped because their explicit values broke a unique index
    pub conflicting_checks: Vec<String>,
    /// Whether fill rows stopped because a domain ran dry (vs. the row cap)
    pub exhausted: bool,
}

/// Generates the rows of one table.
///
/// The session owns the table's uniqueness state; it is discarded with the
/// generator.
pub struct TableRecordGenerator<'a> {
    table: &'a Table,
    domains: BTreeMap<ColumnId, Box<dyn ValueDomain>>,
    trackers: Vec<UniqueTracker>,
    seen_values: AHashMap<ColumnId, AHashSet<String>>,
    max_rows: usize,
    max_draws: usize,
    stats: TableStats,
}

impl<'a> TableRecordGenerator<'a> {
    /// `domains` must hold one domain per emitted column
    pub fn new(table: &'a Table, domains: BTreeMap<ColumnId, Box<dyn ValueDomain>>) -> Self {
        let trackers = table
            .unique_indexes()
            .filter(|idx| idx.columns.iter().all(|c| domains.contains_key(c)))
            .map(|idx| UniqueTracker {
                name: idx.name.clone(),
                columns: idx.columns.clone(),
                nulls_not_distinct: idx.nulls_not_distinct,
                seen: AHashSet::new(),
            })
            .collect();

        Self {
            table,
            domains,
            trackers,
            seen_values: AHashMap::new(),
            max_rows: DEFAULT_MAX_ROWS,
            max_draws: DEFAULT_MAX_DRAWS,
            stats: TableStats::default(),
        }
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_max_draws(mut self, max_draws: usize) -> Self {
        self.max_draws = max_draws.max(1);
        self
    }

    /// Distinct values committed so far for `column`
    pub fn seen_values(&self, column: ColumnId) -> usize {
        self.seen_values.get(&column).map_or(0, |s| s.len())
    }

    pub fn stats(&self) -> &TableStats {
        &self.stats
    }

    /// Emit one row per seed, then fill rows while unique indexes leave room.
    ///
    /// Exhaustion while completing a seed fails the table. Once the seeds are
    /// in, exhaustion of a fill row is the natural end of the table.
    pub fn generate(&mut self, seeds: &[PartialRecord]) -> Result<Records, Error> {
        let emitted: Vec<ColumnId> = self.domains.keys().copied().collect();
        let mut records = Records::new(self.table, &emitted);

        let empty = [PartialRecord::new()];
        let seeds = if seeds.is_empty() { &empty[..] } else { seeds };

        for seed in seeds {
            if records.len() >= self.max_rows {
                break;
            }
            match self.complete_row(seed)? {
                RowOutcome::Complete(row) => records.push(self.commit(row)),
                RowOutcome::Conflict(index) => {
                    debug!(table = %self.table.name, index = %index, "check row collides, skipped");
                    self.stats.conflicting_checks.push(index);
                }
            }
        }

        if self.trackers.is_empty() {
            return Ok(records);
        }

        let fill = PartialRecord::new();
        while records.len() < self.max_rows {
            match self.complete_row(&fill) {
                Ok(RowOutcome::Complete(row)) => records.push(self.commit(row)),
                Ok(RowOutcome::Conflict(_)) => break,
                Err(Error::Exhausted { column, .. }) => {
                    debug!(
                        table = %self.table.name,
                        column = %column,
                        rows = records.len(),
                        "domain exhausted"
                    );
                    self.stats.exhausted = true;
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(records)
    }

    /// Fill every column the seed leaves open with the first domain value
    /// that keeps all unique indexes collision-free.
    ///
    /// Seed values are copied as given. Only domain values are cut to the
    /// column's character limit.
    fn complete_row(&mut self, seed: &PartialRecord) -> Result<RowOutcome, Error> {
        let mut row: AHashMap<ColumnId, Value> = AHashMap::with_capacity(self.domains.len());
        for (column, value) in seed.iter() {
            if self.domains.contains_key(&column) {
                row.insert(column, value.clone());
            }
        }

        if let Some(tracker) = self.trackers.iter().find(|t| t.collides(&row)) {
            return Ok(RowOutcome::Conflict(tracker.name.clone()));
        }

        let open: Vec<ColumnId> = self
            .domains
            .keys()
            .copied()
            .filter(|c| !row.contains_key(c))
            .collect();

        for column in open {
            let value = self.find_value(column, &mut row)?;
            row.insert(column, Some(value));
        }

        Ok(RowOutcome::Complete(row))
    }

    fn find_value(
        &mut self,
        column: ColumnId,
        row: &mut AHashMap<ColumnId, Value>,
    ) -> Result<String, Error> {
        let table_name = self.table.name.canonical();
        let column_name = self
            .table
            .column(column)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| column.to_string());
        let wrap = |err| Error::from_domain(&table_name, &column_name, err);

        let Some(domain) = self.domains.get_mut(&column) else {
            return Err(Error::UnsupportedDomain {
                table: table_name.clone(),
                column: column_name.clone(),
                type_name: String::new(),
            });
        };

        let relevant: Vec<usize> = self
            .trackers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.columns.contains(&column))
            .map(|(i, _)| i)
            .collect();
        let limit = domain.char_limit();
        let max_draws = if domain.is_unbounded() {
            self.max_draws
        } else {
            usize::MAX
        };

        domain.reset().map_err(wrap)?;
        let mut draws = 0;
        while draws < max_draws && domain.next().map_err(wrap)? {
            draws += 1;
            let mut candidate = domain.value().map_err(wrap)?;
            if let Some(limit) = limit {
                truncate_chars(&mut candidate, limit);
            }

            row.insert(column, Some(candidate));
            let collides = relevant.iter().any(|&i| self.trackers[i].collides(row));
            if let Some(Some(candidate)) = row.remove(&column) {
                if !collides {
                    return Ok(candidate);
                }
            }
        }

        Err(Error::Exhausted {
            table: table_name,
            column: column_name,
        })
    }

    /// Record the finished row in every tracker and return it sorted
    fn commit(&mut self, row: AHashMap<ColumnId, Value>) -> Record {
        for tracker in &mut self.trackers {
            if let Some(key) = tracker.key(&row) {
                tracker.seen.insert(key);
            }
        }
        for (column, value) in &row {
            if let Some(v) = value {
                self.seen_values.entry(*column).or_default().insert(v.clone());
            }
        }
        Record::from_pairs(row.into_iter().collect())
    }
}

fn truncate_chars(value: &mut String, limit: usize) {
    if let Some((byte_idx, _)) = value.char_indices().nth(limit) {
        value.truncate(byte_idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_keeps_tuples_apart() {
        let mut a = String::new();
        escape_into(&mut a, "x,y");
        let mut b = String::new();
        escape_into(&mut b, "x");
        b.push(',');
        escape_into(&mut b, "y");
        assert_ne!(a, b);
    }

    #[test]
    fn test_null_key_differs_from_backslash_n() {
        let tracker = UniqueTracker {
            name: "t_email_key".to_string(),
            columns: vec![ColumnId(0)],
            nulls_not_distinct: true,
            seen: AHashSet::new(),
        };
        let null_row: AHashMap<ColumnId, Value> = [(ColumnId(0), None)].into_iter().collect();
        let text_row: AHashMap<ColumnId, Value> =
            [(ColumnId(0), Some("\\N".to_string()))].into_iter().collect();
        assert_eq!(tracker.key(&null_row).as_deref(), Some("\\N"));
        assert_ne!(tracker.key(&null_row), tracker.key(&text_row));
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        let mut s = "héllo".to_string();
        truncate_chars(&mut s, 2);
        assert_eq!(s, "hé");
        let mut short = "ab".to_string();
        truncate_chars(&mut short, 5);
        assert_eq!(short, "ab");
    }
}
