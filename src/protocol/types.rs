//! RESP Reply Types
//!
//! Replies are encoded in RESP2, the wire format every Redis client speaks.
//! Each value starts with a one-byte type prefix and ends with CRLF:
//!
//! - `+` Simple String: `+OK\r\n`
//! - `-` Error: `-ERR key already exists: k\r\n`
//! - `:` Integer: `:3\r\n`
//! - `$` Bulk String: `$5\r\nhello\r\n`, null is `$-1\r\n`
//! - `*` Array: `*2\r\n$1\r\nq\r\n$4\r\na, b\r\n`

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP protocol type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A RESP value sent back to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Status reply without CR or LF in it
    SimpleString(String),

    /// Error reply; by convention the first word is the error kind
    Error(String),

    /// Signed 64-bit integer
    Integer(i64),

    /// Binary-safe string
    BulkString(Bytes),

    /// Null bulk string
    Null,

    /// Ordered list of values
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    pub fn null() -> Self {
        RespValue::Null
    }

    pub fn array(values: Vec<RespValue>) -> Self {
        RespValue::Array(values)
    }

    /// `+OK`
    pub fn ok() -> Self {
        RespValue::simple_string("OK")
    }

    /// `+PONG`
    pub fn pong() -> Self {
        RespValue::simple_string("PONG")
    }

    /// Encodes this value onto the end of `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => encode_line(buf, prefix::SIMPLE_STRING, s.as_bytes()),
            RespValue::Error(s) => encode_line(buf, prefix::ERROR, s.as_bytes()),
            RespValue::Integer(n) => encode_line(buf, prefix::INTEGER, n.to_string().as_bytes()),
            RespValue::BulkString(data) => {
                encode_line(buf, prefix::BULK_STRING, data.len().to_string().as_bytes());
                buf.put_slice(data);
                buf.put_slice(CRLF);
            }
            RespValue::Null => encode_line(buf, prefix::BULK_STRING, b"-1"),
            RespValue::Array(values) => {
                encode_line(buf, prefix::ARRAY, values.len().to_string().as_bytes());
                for value in values {
                    value.encode(buf);
                }
            }
        }
    }

    /// Encodes this value into a fresh buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RespValue::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }
}

#[inline]
fn encode_line(buf: &mut BytesMut, prefix: u8, body: &[u8]) {
    buf.reserve(body.len() + 3);
    buf.put_u8(prefix);
    buf.put_slice(body);
    buf.put_slice(CRLF);
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(s) => write!(f, "{}", s),
            RespValue::Error(s) => write!(f, "(error) {}", s),
            RespValue::Integer(n) => write!(f, "(integer) {}", n),
            RespValue::BulkString(data) => write!(f, "\"{}\"", String::from_utf8_lossy(data)),
            RespValue::Null => write!(f, "(nil)"),
            RespValue::Array(values) if values.is_empty() => write!(f, "(empty array)"),
            RespValue::Array(values) => {
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, v)?;
                }
                Ok(())
            }
        }
    }
}
