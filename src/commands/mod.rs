//! Command Handler Module
//!
//! This module implements the command processing layer for TideKV.
//! It receives decoded requests, validates their arguments, executes them
//! against the store and returns RESP replies.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ Request Decoder │  (protocol module)
//! └────────┬────────┘
//!          │ Vec<Bytes>
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Dispatch     │
//! │  - Validate     │  (args: arity, SET options, expiry tokens)
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │     Store       │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `SET`, `GET`, `GETALL`
//! - `QPUSH`, `QPOP`
//! - `PING`, `ECHO`, `QUIT`

pub mod args;
pub mod handler;

pub use args::{parse_expiry, CommandError};
pub use handler::CommandHandler;
