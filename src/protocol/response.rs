//! Response definitions
//!
//! Represents responses to clients.

use std::fmt;

/// A response to send to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Mutation applied
    Ok,

    /// Value found by GET
    Value(String),

    /// Table exists but the key does not
    KeyNotFound,

    /// No such table in memory or on disk
    UnknownTable,

    /// Malformed request
    UnknownCommand,

    /// Farewell before the connection closes
    Bye,
}

impl Response {
    /// Whether the session ends after this response
    pub fn closes_session(&self) -> bool {
        matches!(self, Response::Bye)
    }
}

/// Wire text of the response (without the trailing newline)
impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok => f.write_str("OK"),
            Response::Value(value) => f.write_str(value),
            Response::KeyNotFound => f.write_str("key does not exist"),
            Response::UnknownTable => f.write_str("Unknown table"),
            Response::UnknownCommand => f.write_str("Unknown command"),
            Response::Bye => f.write_str("Bye"),
        }
    }
}
