//! Table Module
//!
//! In-memory representation of one named table.
//!
//! ## Responsibilities
//! - Hold the ordered entry sequence of a table
//! - Enforce the lock mode of every operation (shared for reads,
//!   exclusive for mutations)
//! - Capture a snapshot of the post-mutation state while the exclusive
//!   lock is still held
//!
//! ## Data Structure Choice
//! A plain `Vec<Entry>` with linear lookup:
//! - Insertion order is stable until a key is removed
//! - Removal swaps the last entry into the hole (no ordering promise)

mod records;
mod locked;

use serde::{Deserialize, Serialize};

pub use records::RecordStore;
pub use locked::Table;

/// A single key/value pair stored in a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Immutable copy of a table's entries, taken when a mutation completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Name of the table the entries belong to
    pub table: String,

    /// Full entry sequence after the mutation
    pub entries: Vec<Entry>,
}

/// Receiver of snapshots produced by table mutations
///
/// Called while the table's exclusive lock is held, so implementations
/// must not block on client activity.
pub trait SnapshotSink {
    fn enqueue(&self, snapshot: Snapshot);
}
