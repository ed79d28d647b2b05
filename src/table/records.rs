//! Record store
//!
//! Ordered entry sequence with O(n) lookup. Pure data, no locking and no I/O.

use super::Entry;

/// The entries of one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    entries: Vec<Entry>,
}

impl RecordStore {
    /// Create a new empty record store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from loaded entries
    ///
    /// A repeated key keeps the position of its first occurrence and the
    /// value of its last one.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let mut store = Self::new();
        for entry in entries {
            store.upsert(entry.key, entry.value);
        }
        store
    }

    /// Value stored under `key`
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.position(key).map(|i| self.entries[i].value.as_str())
    }

    /// Replace the value of an existing key in place, or append a new entry
    pub fn upsert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => self.entries[i].value = value,
            None => self.entries.push(Entry { key, value }),
        }
    }

    /// Remove `key`, returning whether it was present
    ///
    /// The last entry moves into the removed slot.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.position(key) {
            Some(i) => {
                self.entries.swap_remove(i);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in storage order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }
}
