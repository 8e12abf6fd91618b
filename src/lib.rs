//! # TideKV - An In-Memory Key-Value Store with Per-Key Queues
//!
//! TideKV stores string values with optional TTL expiry and, independently,
//! a FIFO queue under every key. It speaks the RESP protocol, so `redis-cli`
//! works as a client.
//!
//! ## Features
//!
//! - **Conditional writes**: `SET ... NX` refuses to overwrite an existing key
//! - **TTL Support**: `SET ... EX 10s`, with units `S`, `M`, `H` and `D`
//! - **Lazy Expiry**: expired keys are removed when read, never swept
//! - **Queues**: `QPUSH`/`QPOP` with non-blocking pops
//! - **Async I/O**: one Tokio task per connection, pipelining supported
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                              TideKV                                 │
//! │                                                                     │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐              │
//! │  │   Server    │───>│ Connection  │───>│  Command    │              │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │              │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘              │
//! │                            │                  │                     │
//! │                            ▼                  ▼                     │
//! │                     ┌─────────────┐    ┌──────────────────────────┐ │
//! │                     │    RESP     │    │          Store           │ │
//! │                     │   Decoder   │    │ RwLock<HashMap<_,Entry>> │ │
//! │                     └─────────────┘    │   Entry.queue: Mutex     │ │
//! │                                        └──────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use tidekv::Server;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let server = Server::bind("127.0.0.1:6380").await?;
//!     server.run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     }).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `SET key value [EX <n><S|M|H|D>] [NX|XX]`
//! - `GET key`
//! - `QPUSH key value [value ...]`
//! - `QPOP key`
//! - `GETALL`
//! - `PING [message]`, `ECHO message`, `QUIT`
//!
//! ## Module Overview
//!
//! - [`storage`]: the store, its entries and queues
//! - [`commands`]: argument validation and command dispatch
//! - [`protocol`]: RESP request decoder and reply encoder
//! - [`connection`]: per-client read/execute/reply loop
//! - [`server`]: TCP accept loop
//! - [`config`]: command-line configuration

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

pub use commands::CommandHandler;
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{parse_request, ParseError, RespValue};
pub use server::Server;
pub use storage::{SetOptions, Store, StoreError};

/// The default port TideKV listens on
pub const DEFAULT_PORT: u16 = 6380;

/// The default host TideKV binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of TideKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
