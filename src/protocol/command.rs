//! Request definitions
//!
//! Represents parsed requests from clients.

use std::fmt;

/// A parsed request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Read a value
    Get { table: String, key: String },

    /// Insert or replace a value
    Set { table: String, key: String, value: String },

    /// Remove a key
    Del { table: String, key: String },

    /// End the session
    Quit,

    /// Anything the protocol does not recognise
    Invalid,
}

impl Request {
    /// Table the request addresses, if any
    pub fn table(&self) -> Option<&str> {
        match self {
            Request::Get { table, .. } | Request::Set { table, .. } | Request::Del { table, .. } => {
                Some(table.as_str())
            }
            Request::Quit | Request::Invalid => None,
        }
    }

    /// Whether executing the request may change a table
    pub fn is_mutation(&self) -> bool {
        matches!(self, Request::Set { .. } | Request::Del { .. })
    }
}

/// Renders the request as a wire line (without the trailing newline)
impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Get { table, key } => write!(f, "{} GET {}", table, key),
            Request::Set { table, key, value } => write!(f, "{} SET {} {}", table, key, value),
            Request::Del { table, key } => write!(f, "{} DEL {}", table, key),
            Request::Quit => write!(f, "Q"),
            Request::Invalid => Ok(()),
        }
    }
}

/// Whether `name` can be used as a table name
///
/// Table names become file names inside the data directory.
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
}
