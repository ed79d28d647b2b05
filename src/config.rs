//! Configuration for TableKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, TableKvError};

/// Main configuration for a TableKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding one backing file per table
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── users        (table "users")
    ///     └── orders       (table "orders")
    pub data_dir: PathBuf,

    /// fsync each table file after it is rewritten
    pub sync_on_write: bool,

    // -------------------------------------------------------------------------
    // Cache & Persistence Configuration
    // -------------------------------------------------------------------------
    /// Number of lock stripes in the table cache
    pub cache_shards: usize,

    /// Capacity of the snapshot queue before producers feel backpressure
    pub persist_queue_capacity: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = no timeout)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = no timeout)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./db"),
            sync_on_write: false,
            cache_shards: 16,
            persist_queue_capacity: 1024,
            listen_addr: "127.0.0.1:8888".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings that would leave a component unusable
    pub fn validate(&self) -> Result<()> {
        if self.cache_shards == 0 {
            return Err(TableKvError::Config("cache_shards must be at least 1".to_string()));
        }
        if self.persist_queue_capacity == 0 {
            return Err(TableKvError::Config(
                "persist_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(TableKvError::Config("max_connections must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (one file per table)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// fsync table files after every rewrite
    pub fn sync_on_write(mut self, sync: bool) -> Self {
        self.config.sync_on_write = sync;
        self
    }

    /// Set the number of cache lock stripes
    pub fn cache_shards(mut self, shards: usize) -> Self {
        self.config.cache_shards = shards;
        self
    }

    /// Set the snapshot queue capacity
    pub fn persist_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.persist_queue_capacity = capacity;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
