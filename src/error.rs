//! Error types for TableKV
//!
//! Lookup misses and malformed commands are protocol responses, not errors.
//! This type covers the failures that escape a component boundary.

use thiserror::Error;

/// Result type alias using TableKvError
pub type Result<T> = std::result::Result<T, TableKvError>;

/// Unified error type for TableKV operations
#[derive(Debug, Error)]
pub enum TableKvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Table File Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for TableKvError {
    fn from(e: serde_json::Error) -> Self {
        TableKvError::Serialization(e.to_string())
    }
}
