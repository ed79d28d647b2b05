//! Protocol codec
//!
//! Line framing, request tokenization, and response encoding.
//!
//! ## Tokenization
//! ```text
//!   users   SET   name   Alice  Smith
//!   └─┬─┘   └┬┘   └─┬┘   └────┬─────┘
//!   table   cmd    key   value (rest of line, trimmed)
//! ```

use std::io::{BufRead, Read, Write};

use crate::error::{Result, TableKvError};
use super::{is_valid_table_name, Request, Response};

/// Maximum accepted request line length (1 MB)
pub const MAX_LINE_LEN: usize = 1024 * 1024;

// =============================================================================
// Request Parsing
// =============================================================================

/// Parse one request line
///
/// Never fails: anything unrecognised becomes `Request::Invalid`.
pub fn parse_request(line: &str) -> Request {
    let Some((first, rest)) = next_token(line) else {
        return Request::Invalid;
    };

    let Some((verb, rest)) = next_token(rest) else {
        return if first.eq_ignore_ascii_case("q") {
            Request::Quit
        } else {
            Request::Invalid
        };
    };

    if !is_valid_table_name(first) {
        return Request::Invalid;
    }
    let table = first.to_string();

    match verb.to_ascii_lowercase().as_str() {
        "set" => match next_token(rest) {
            Some((key, value)) => {
                let value = value.trim();
                if value.is_empty() {
                    return Request::Invalid;
                }
                Request::Set {
                    table,
                    key: key.to_string(),
                    value: value.to_string(),
                }
            }
            None => Request::Invalid,
        },
        "get" => match single_key(rest) {
            Some(key) => Request::Get { table, key },
            None => Request::Invalid,
        },
        "del" => match single_key(rest) {
            Some(key) => Request::Del { table, key },
            None => Request::Invalid,
        },
        _ => Request::Invalid,
    }
}

/// Split off the next whitespace-delimited token
///
/// Returns the token and the unconsumed remainder (leading whitespace kept).
fn next_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    Some((&input[..end], &input[end..]))
}

/// Exactly one remaining token
fn single_key(rest: &str) -> Option<String> {
    let (key, tail) = next_token(rest)?;
    if tail.trim().is_empty() {
        Some(key.to_string())
    } else {
        None
    }
}

// =============================================================================
// Line I/O
// =============================================================================

/// Read and parse the next request line
///
/// Returns `Ok(None)` at end of stream. A trailing `\r\n` or `\n` is
/// stripped; invalid UTF-8 is replaced rather than rejected.
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<Option<Request>> {
    let mut buf = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_LINE_LEN as u64 + 1)
        .read_until(b'\n', &mut buf)?;

    if read == 0 {
        return Ok(None);
    }
    if buf.len() > MAX_LINE_LEN && buf.last() != Some(&b'\n') {
        return Err(TableKvError::Protocol(format!(
            "Request line exceeds {} bytes",
            MAX_LINE_LEN
        )));
    }

    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(Some(parse_request(&String::from_utf8_lossy(&buf))))
}

/// Write a response line and flush it
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writeln!(writer, "{}", response)?;
    writer.flush()?;
    Ok(())
}
