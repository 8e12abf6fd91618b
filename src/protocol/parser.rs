//! Incremental RESP Request Decoder
//!
//! Clients send commands in one of two shapes:
//!
//! - **Multibulk**: an array of bulk strings, what every Redis client library
//!   emits: `*2\r\n$3\r\nGET\r\n$4\r\nname\r\n`
//! - **Inline**: a single space-separated line, handy with `telnet` or `nc`:
//!   `GET name\r\n`
//!
//! [`parse_request`] looks at the front of a buffer and returns:
//!
//! - `Ok(Some((args, consumed)))`: a complete request, `consumed` bytes long
//! - `Ok(None)`: the request is not complete yet, read more and retry
//! - `Err(ParseError)`: the bytes can never become a valid request
//!
//! Nothing is consumed on `Ok(None)`, so the caller simply appends more data
//! and calls again.

use crate::protocol::types::{prefix, CRLF};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur while decoding a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A length header is not a valid decimal integer
    #[error("invalid length header: {0}")]
    InvalidLength(String),

    /// A multibulk element does not start with `$`
    #[error("expected '$', got {0:#04x}")]
    ExpectedBulkString(u8),

    /// A bulk string is not followed by CRLF
    #[error("bulk string missing trailing CRLF")]
    MissingCrlf,

    /// A multibulk request with zero or negative element count
    #[error("invalid multibulk length: {0}")]
    InvalidMultibulkLength(i64),

    /// A bulk string declares a size above the limit
    #[error("bulk string too large: {size} bytes (max: {max})")]
    BulkTooLarge { size: usize, max: usize },
}

/// Result type for decoding operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// A decoded request: its arguments and the number of bytes it occupied.
pub type Request = (Vec<Bytes>, usize);

/// Maximum size for a single bulk string argument (512 KB)
pub const MAX_BULK_SIZE: usize = 512 * 1024;

/// Maximum number of arguments in a multibulk request
pub const MAX_MULTIBULK_LEN: usize = 64 * 1024;

/// Decodes one request from the front of `buf`.
///
/// Blank inline lines are skipped and reported as zero-argument requests so
/// the caller can consume them.
pub fn parse_request(buf: &[u8]) -> ParseResult<Option<Request>> {
    match buf.first() {
        None => Ok(None),
        Some(&prefix::ARRAY) => parse_multibulk(buf),
        Some(_) => parse_inline(buf),
    }
}

/// `*<n>\r\n` followed by `n` bulk strings.
fn parse_multibulk(buf: &[u8]) -> ParseResult<Option<Request>> {
    let Some((count, mut pos)) = read_length(buf, 1)? else {
        return Ok(None);
    };

    if count <= 0 || count as usize > MAX_MULTIBULK_LEN {
        return Err(ParseError::InvalidMultibulkLength(count));
    }

    let mut args = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let Some(&tag) = buf.get(pos) else {
            return Ok(None);
        };
        if tag != prefix::BULK_STRING {
            return Err(ParseError::ExpectedBulkString(tag));
        }

        let Some((len, data_start)) = read_length(buf, pos + 1)? else {
            return Ok(None);
        };
        if len < 0 {
            return Err(ParseError::InvalidLength(len.to_string()));
        }
        let len = len as usize;
        if len > MAX_BULK_SIZE {
            return Err(ParseError::BulkTooLarge {
                size: len,
                max: MAX_BULK_SIZE,
            });
        }

        let data_end = data_start + len;
        if buf.len() < data_end + CRLF.len() {
            return Ok(None);
        }
        if &buf[data_end..data_end + CRLF.len()] != CRLF {
            return Err(ParseError::MissingCrlf);
        }

        args.push(Bytes::copy_from_slice(&buf[data_start..data_end]));
        pos = data_end + CRLF.len();
    }

    Ok(Some((args, pos)))
}

/// A whitespace-separated line terminated by CRLF (a bare LF is accepted).
fn parse_inline(buf: &[u8]) -> ParseResult<Option<Request>> {
    let Some(lf) = buf.iter().position(|&b| b == b'\n') else {
        return Ok(None);
    };

    let line = buf[..lf].strip_suffix(b"\r").unwrap_or(&buf[..lf]);
    let args = line
        .split(|b| b.is_ascii_whitespace())
        .filter(|word| !word.is_empty())
        .map(Bytes::copy_from_slice)
        .collect();

    Ok(Some((args, lf + 1)))
}

/// Reads a decimal length terminated by CRLF starting at `start`.
///
/// Returns the value and the position just past the CRLF.
fn read_length(buf: &[u8], start: usize) -> ParseResult<Option<(i64, usize)>> {
    let Some(rest) = buf.get(start..) else {
        return Ok(None);
    };
    let Some(end) = rest.windows(2).position(|w| w == CRLF) else {
        return Ok(None);
    };

    let digits = &rest[..end];
    let value = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ParseError::InvalidLength(String::from_utf8_lossy(digits).into_owned()))?;

    Ok(Some((value, start + end + CRLF.len())))
}
