//! # TableKV
//!
//! A networked key-value store organised in named tables:
//! - One flat file per table, loaded into memory on first access
//! - Per-table reader/writer locking
//! - Background persistence of post-mutation snapshots
//! - Line-oriented TCP protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │            (one thread per connection)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Engine (commands)                           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ TableCache  │─────────▶│    Table    │
//!   │  (striped)  │          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │ snapshot
//!                                   ▼
//!                           ┌─────────────┐
//!                           │  Persister  │
//!                           │ (1 thread)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod table;
pub mod cache;
pub mod persist;
pub mod protocol;
pub mod network;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{TableKvError, Result};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of TableKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
