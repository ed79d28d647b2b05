//! Backing file codec
//!
//! Load and rewrite the file behind a single table.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::table::{Entry, RecordStore, Snapshot};

/// Path of the backing file for `table`
pub fn table_path(data_dir: &Path, table: &str) -> PathBuf {
    data_dir.join(table)
}

/// Load a table's records from its backing file
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_table(data_dir: &Path, table: &str) -> Result<Option<RecordStore>> {
    let path = table_path(data_dir, table);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let entries: Vec<Entry> = serde_json::from_slice(&bytes)?;
    Ok(Some(RecordStore::from_entries(entries)))
}

/// Rewrite a table's backing file with the snapshot contents
///
/// The file is created or truncated, then the full entry sequence written.
pub fn write_snapshot(data_dir: &Path, snapshot: &Snapshot, sync: bool) -> Result<()> {
    let path = table_path(data_dir, &snapshot.table);
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, &snapshot.entries)?;
    writer.flush()?;

    if sync {
        writer.get_ref().sync_all()?;
    }
    Ok(())
}
