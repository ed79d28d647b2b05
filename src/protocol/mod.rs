//! Protocol Module
//!
//! Defines the line protocol for client-server communication.
//!
//! ## Request Format
//! One request per line, tokens separated by whitespace:
//! ```text
//! <table> SET <key> <value...>
//! <table> GET <key>
//! <table> DEL <key>
//! Q
//! ```
//! The command token is case-insensitive; table and key are not. A `SET`
//! value is everything after the key, so it may contain spaces.
//!
//! ## Responses
//! - `OK`
//! - `<value>`
//! - `key does not exist`
//! - `Unknown table`
//! - `Unknown command`
//! - `Bye` (the server then closes the connection)

mod command;
mod response;
mod codec;

pub use command::{is_valid_table_name, Request};
pub use response::Response;
pub use codec::{parse_request, read_request, write_response};
