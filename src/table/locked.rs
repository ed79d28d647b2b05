//! Table implementation
//!
//! A named record store behind a reader/writer lock.

use parking_lot::RwLock;

use super::{RecordStore, Snapshot, SnapshotSink};

/// A named, independently locked table
///
/// ## Concurrency:
/// - `get` / `snapshot`: shared lock, many concurrent readers
/// - `set` / `delete`: exclusive lock; the snapshot is handed to the sink
///   before the lock is released, so sinks observe mutations in lock order
pub struct Table {
    name: String,
    records: RwLock<RecordStore>,
}

impl Table {
    /// Create a new empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_records(name, RecordStore::new())
    }

    /// Create a table from already loaded records
    pub fn with_records(name: impl Into<String>, records: RecordStore) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(records),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a value (shared lock)
    pub fn get(&self, key: &str) -> Option<String> {
        self.records.read().lookup(key).map(str::to_owned)
    }

    /// Insert or replace a value (exclusive lock) and enqueue the snapshot
    pub fn set(&self, key: &str, value: &str, sink: &dyn SnapshotSink) {
        let mut records = self.records.write();
        records.upsert(key, value);
        sink.enqueue(self.capture(&records));
    }

    /// Remove a key (exclusive lock)
    ///
    /// A snapshot is enqueued only when the key existed.
    pub fn delete(&self, key: &str, sink: &dyn SnapshotSink) -> bool {
        let mut records = self.records.write();
        if !records.remove(key) {
            return false;
        }
        sink.enqueue(self.capture(&records));
        true
    }

    /// Copy of the current contents (shared lock)
    pub fn snapshot(&self) -> Snapshot {
        self.capture(&self.records.read())
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn capture(&self, records: &RecordStore) -> Snapshot {
        Snapshot {
            table: self.name.clone(),
            entries: records.entries().to_vec(),
        }
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}
