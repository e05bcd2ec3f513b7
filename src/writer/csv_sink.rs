//! CSV output: one `<schema>.<table>.csv` per table.

use super::Sink;
use crate::record::Records;
use crate::schema::Table;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes each table to its own CSV file, header row first.
///
/// NULL is written as an empty field.
pub struct CsvSink {
    output_dir: PathBuf,
    files: Vec<PathBuf>,
}

impl CsvSink {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            files: Vec::new(),
        }
    }

    pub fn ensure_output_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.output_dir)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Files written so far, in write order
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn path_for(&self, table: &Table) -> PathBuf {
        self.output_dir.join(format!("{}.csv", table.name.canonical()))
    }
}

impl Sink for CsvSink {
    fn write_table(&mut self, table: &Table, records: &Records) -> anyhow::Result<()> {
        let path = self.path_for(table);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        writer.write_record(records.columns().iter().map(|c| c.name.as_str()))?;
        for row in records.rows() {
            writer.write_record(
                records
                    .row_values(row)
                    .map(|value| value.as_deref().unwrap_or("")),
            )?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", path.display()))?;

        self.files.push(path);
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
