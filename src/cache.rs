//! Table Cache
//!
//! Process-wide registry mapping table name → live `Table`.
//!
//! ## Concurrency Model: Striped Map of Slots
//!
//! The name space is split across `shard_count` shards, each a
//! `RwLock<HashMap<String, Arc<Slot>>>`. A slot is the per-name cell that
//! eventually holds the one `Table` for that name:
//! - **Hits** take the owning shard's shared lock and read the slot's
//!   `OnceLock`; neither can block on disk I/O
//! - **Misses** insert an empty slot under the shard's exclusive lock, drop
//!   the shard lock, and load the backing file under the slot's own mutex,
//!   so racing first-accesses to one name share a single load and a single
//!   `Table`, while other names in the shard stay reachable
//!
//! A read-path miss with no usable file retires its slot and removes it
//! from the shard. Lock order is slot mutex → shard lock; shard locks are
//! never held while waiting on a slot.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::convert::Infallible;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};

use crate::error::TableKvError;
use crate::persist::load_table;
use crate::table::Table;

type Shard = RwLock<HashMap<String, Arc<Slot>>>;

/// Per-name cell holding the table once it has been loaded or created
#[derive(Default)]
struct Slot {
    table: OnceLock<Arc<Table>>,

    /// Serialises loads of this name; `true` once the slot was removed
    /// from its shard
    retired: Mutex<bool>,
}

/// Cache of loaded tables
pub struct TableCache {
    /// Directory holding the backing files
    data_dir: PathBuf,

    shards: Vec<Shard>,
}

impl TableCache {
    /// Create an empty cache over `data_dir`
    ///
    /// # Panics
    /// If `shard_count` is zero (`Config::validate` rejects that setting).
    pub fn new(data_dir: impl Into<PathBuf>, shard_count: usize) -> Self {
        assert!(shard_count > 0, "table cache needs at least one shard");
        let shards = (0..shard_count)
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Self {
            data_dir: data_dir.into(),
            shards,
        }
    }

    /// Cached table, or the table loaded from its backing file (read path)
    ///
    /// Returns `None` when no usable file exists; nothing is registered then.
    pub fn get_or_load(&self, name: &str) -> Option<Arc<Table>> {
        self.resolve(name, || Err(())).ok()
    }

    /// Cached or loaded table, creating an empty one when neither exists
    /// (write path)
    pub fn get_or_create(&self, name: &str) -> Arc<Table> {
        let created = self.resolve(name, || {
            tracing::debug!("Creating table {}", name);
            Ok::<_, Infallible>(Table::new(name))
        });
        match created {
            Ok(table) => table,
            Err(never) => match never {},
        }
    }

    /// Whether `name` is currently cached
    pub fn contains(&self, name: &str) -> bool {
        self.shard(name)
            .read()
            .get(name)
            .is_some_and(|slot| slot.table.get().is_some())
    }

    /// Number of cached tables
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.read().values().filter(|slot| slot.table.get().is_some()).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of all cached tables, sorted
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .shards
            .iter()
            .flat_map(|s| {
                s.read()
                    .iter()
                    .filter(|(_, slot)| slot.table.get().is_some())
                    .map(|(name, _)| name.clone())
                    .collect::<Vec<_>>()
            })
            .collect();
        names.sort();
        names
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Find or fill the slot for `name`
    ///
    /// `on_missing` runs when no usable file exists; its error retires the
    /// slot and is returned to the caller.
    fn resolve<E>(
        &self,
        name: &str,
        on_missing: impl Fn() -> Result<Table, E>,
    ) -> Result<Arc<Table>, E> {
        loop {
            let slot = self.slot(name);
            if let Some(table) = slot.table.get() {
                return Ok(Arc::clone(table));
            }

            let mut retired = slot.retired.lock();
            if *retired {
                // Removed from the shard while we waited; start over
                continue;
            }
            if let Some(table) = slot.table.get() {
                return Ok(Arc::clone(table));
            }

            let table = match self.load(name) {
                Some(table) => table,
                None => match on_missing() {
                    Ok(table) => table,
                    Err(e) => {
                        *retired = true;
                        self.remove_slot(name, &slot);
                        return Err(e);
                    }
                },
            };

            let table = slot.table.get_or_init(|| Arc::new(table));
            return Ok(Arc::clone(table));
        }
    }

    /// Existing slot for `name`, or a freshly inserted empty one
    fn slot(&self, name: &str) -> Arc<Slot> {
        let shard = self.shard(name);
        if let Some(slot) = shard.read().get(name) {
            return Arc::clone(slot);
        }
        Arc::clone(shard.write().entry(name.to_string()).or_default())
    }

    fn remove_slot(&self, name: &str, slot: &Arc<Slot>) {
        let mut map = self.shard(name).write();
        if map.get(name).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            map.remove(name);
        }
    }

    fn shard(&self, name: &str) -> &Shard {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[index]
    }

    /// Read a table from disk; missing and unreadable files both yield `None`
    fn load(&self, name: &str) -> Option<Table> {
        match load_table(&self.data_dir, name) {
            Ok(Some(records)) => {
                tracing::debug!("Loaded table {} ({} entries)", name, records.len());
                Some(Table::with_records(name, records))
            }
            Ok(None) => {
                tracing::debug!("No backing file for table {}", name);
                None
            }
            Err(TableKvError::Serialization(e)) => {
                tracing::warn!("Ignoring malformed file for table {}: {}", name, e);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to read table {}: {}", name, e);
                None
            }
        }
    }
}
