use crate::error::Result;
use crate::schema::{CostRecord, RecordTable};
use csv::{ReaderBuilder, WriterBuilder};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Column order of the persisted table file.
pub const CSV_HEADER: [&str; 4] = ["Month", "Category", "Cost", "Description"];

/// Flat-file persistence for the record table.
///
/// The whole table is rewritten on every save; there is no append mode, no
/// atomic rename and no file locking. Concurrent writers race and the last
/// writer wins, which is acceptable for the single-user scope.
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted table, or returns an empty table if the file does
    /// not exist yet. A malformed file surfaces as a parse error; the caller
    /// has no recovery path.
    pub fn load(&self) -> Result<RecordTable> {
        if !self.path.exists() {
            debug!("no data file at {}, starting empty", self.path.display());
            return Ok(RecordTable::new());
        }

        let mut reader = ReaderBuilder::new().from_path(&self.path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize::<CostRecord>() {
            rows.push(row?);
        }

        let table = RecordTable::from_records(rows);
        info!(
            "loaded {} records from {}",
            table.len(),
            self.path.display()
        );
        Ok(table)
    }

    /// Overwrites the persisted file with the full table contents. The header
    /// row is always written, so repeated save/load cycles are byte-stable.
    pub fn save(&self, table: &RecordTable) -> Result<()> {
        let mut writer = WriterBuilder::new().has_headers(false).from_path(&self.path)?;
        writer.write_record(CSV_HEADER)?;
        for record in table {
            writer.serialize(record)?;
        }
        writer.flush()?;
        debug!(
            "saved {} records to {}",
            table.len(),
            self.path.display()
        );
        Ok(())
    }
}
