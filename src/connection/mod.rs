//! Connection Handler Module
//!
//! This module manages individual client connections to TideKV.
//! Each client connection is handled by its own async task.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                     (server.rs)                             │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │ accept(), spawn task
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌────────────┐   ┌──────────────┐   ┌─────────────┐        │
//! │  │ Read bytes │──>│ Decode reqs  │──>│ Execute all │        │
//! │  └────────────┘   └──────────────┘   └──────┬──────┘        │
//! │        ▲                                    ▼               │
//! │        └──────────────────────────  ┌──────────────┐        │
//! │                                     │ Flush replies│        │
//! │                                     └──────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Async I/O**: Tokio tasks, generic over any `AsyncRead + AsyncWrite`
//! - **Pipelining**: every complete request in a read is executed before the
//!   replies are flushed in one write
//! - **Statistics**: connection and command counters shared across tasks

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
