//! RESP Protocol Implementation
//!
//! TideKV speaks the Redis Serialization Protocol so that `redis-cli` and any
//! Redis client library can drive it.
//!
//! ## Modules
//!
//! - `parser`: incremental decoder for incoming requests (multibulk and inline)
//! - `types`: the `RespValue` reply type and its encoder
//!
//! ## Example
//!
//! ```
//! use tidekv::protocol::{parse_request, RespValue};
//!
//! let data = b"*2\r\n$4\r\nQPOP\r\n$4\r\njobs\r\n";
//! let (args, consumed) = parse_request(data).unwrap().unwrap();
//! assert_eq!(args.len(), 2);
//! assert_eq!(consumed, data.len());
//!
//! let reply = RespValue::bulk_string("job-1");
//! assert_eq!(&reply.to_bytes()[..], b"$5\r\njob-1\r\n");
//! ```

pub mod parser;
pub mod types;

pub use parser::{parse_request, ParseError, ParseResult, Request};
pub use types::RespValue;
