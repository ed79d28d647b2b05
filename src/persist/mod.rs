//! Persistence Module
//!
//! Moves table snapshots from the request path to disk.
//!
//! ## Responsibilities
//! - Read a table's backing file on first access
//! - Queue snapshots without blocking the request path
//! - Rewrite one backing file per dequeued snapshot, in arrival order
//!
//! ## File Format
//! One file per table, named after the table, holding a JSON array:
//! ```text
//! [{"key":"name","value":"Alice"},{"key":"age","value":"30"}]
//! ```
//! Each write replaces the whole file.

pub mod file;
mod pipeline;

pub use file::{load_table, table_path, write_snapshot};
pub use pipeline::Persister;
