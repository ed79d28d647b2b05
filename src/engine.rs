//! Engine Module
//!
//! The command processor that coordinates all components.
//!
//! ## Responsibilities
//! - Resolve tables through the cache (load on read, create on write)
//! - Apply each request under the right table lock mode
//! - Hand post-mutation snapshots to the persister
//! - Shut the persister down cleanly

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::cache::TableCache;
use crate::config::Config;
use crate::error::Result;
use crate::persist::Persister;
use crate::protocol::{Request, Response};
use crate::table::Table;

/// The main store engine
///
/// ## Locking Protocol
///
/// 1. **Cache shard lock**: taken inside `TableCache` for the
///    lookup-or-create step only
/// 2. **Table lock**: shared for GET, exclusive for SET and DEL
///
/// A mutation's snapshot is enqueued while its exclusive table lock is
/// held, so per-table file writes happen in mutation order.
///
/// `Response::Ok` means the mutation has been applied in memory. The file
/// write happens later on the persister thread and its failure is only
/// logged.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Loaded tables
    cache: TableCache,

    /// Background writer for table files
    persister: Persister,
}

impl Engine {
    /// Open an engine over the configured data directory
    ///
    /// Creates the directory if needed and starts the persister thread.
    /// Tables are loaded lazily on first access.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let cache = TableCache::new(&config.data_dir, config.cache_shards);
        let persister = Persister::start(
            &config.data_dir,
            config.persist_queue_capacity,
            config.sync_on_write,
        )?;

        tracing::info!("Engine opened at {}", config.data_dir.display());

        Ok(Self {
            config,
            cache,
            persister,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Execute a request
    ///
    /// Routes requests to the appropriate handler
    pub fn execute(&self, request: Request) -> Response {
        match request {
            Request::Get { table, key } => match self.get(&table, &key) {
                Lookup::Found(value) => Response::Value(value),
                Lookup::MissingKey => Response::KeyNotFound,
                Lookup::MissingTable => Response::UnknownTable,
            },
            Request::Set { table, key, value } => {
                self.set(&table, &key, &value);
                Response::Ok
            }
            Request::Del { table, key } => match self.delete(&table, &key) {
                Lookup::Found(()) => Response::Ok,
                Lookup::MissingKey => Response::KeyNotFound,
                Lookup::MissingTable => Response::UnknownTable,
            },
            Request::Quit => Response::Bye,
            Request::Invalid => Response::UnknownCommand,
        }
    }

    /// Look up a value (shared table lock)
    pub fn get(&self, table: &str, key: &str) -> Lookup<String> {
        let Some(table) = self.cache.get_or_load(table) else {
            return Lookup::MissingTable;
        };
        match table.get(key) {
            Some(value) => Lookup::Found(value),
            None => Lookup::MissingKey,
        }
    }

    /// Insert or replace a value, creating the table if needed
    /// (exclusive table lock)
    pub fn set(&self, table: &str, key: &str, value: &str) {
        let table = self.cache.get_or_create(table);
        table.set(key, value, &self.persister);
    }

    /// Remove a key (exclusive table lock)
    pub fn delete(&self, table: &str, key: &str) -> Lookup<()> {
        let Some(table) = self.cache.get_or_load(table) else {
            return Lookup::MissingTable;
        };
        if table.delete(key, &self.persister) {
            Lookup::Found(())
        } else {
            Lookup::MissingKey
        }
    }

    /// Wait until every mutation so far has reached its table file
    /// (or failed to)
    pub fn sync(&self) -> Result<()> {
        self.persister.sync()
    }

    /// Close the engine gracefully
    ///
    /// Drains the persistence queue and joins the writer thread
    pub fn close(self) -> Result<()> {
        self.persister.shutdown()?;
        tracing::info!("Engine closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get a cached table without loading it
    pub fn cached_table(&self, name: &str) -> Option<Arc<Table>> {
        if self.cache.contains(name) {
            self.cache.get_or_load(name)
        } else {
            None
        }
    }

    /// Get the table cache
    pub fn cache(&self) -> &TableCache {
        &self.cache
    }

    /// Number of table files written so far
    pub fn persisted_count(&self) -> u64 {
        self.persister.written()
    }

    /// Number of table file writes that failed
    pub fn failed_persist_count(&self) -> u64 {
        self.persister.failed()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Outcome of a keyed table operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    MissingKey,
    MissingTable,
}
