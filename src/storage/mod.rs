//! Storage Module
//!
//! The in-memory core of TideKV: a key-value store with lazy TTL expiry and
//! an independent FIFO queue per key.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │             RwLock<HashMap<String, Entry>>                  │
//! │                                                             │
//! │   SET, QPUSH ──> write lock      GET, GETALL, QPOP ──> read │
//! │                                                             │
//! │  ┌─────────────────────┐   ┌─────────────────────┐         │
//! │  │ Entry "user"        │   │ Entry "jobs"        │   ...   │
//! │  │  value: "Ariz"      │   │  value: ""          │         │
//! │  │  expires_at: +10s   │   │  expires_at: None   │         │
//! │  │  queue: Mutex([])   │   │  queue: Mutex([a,b])│         │
//! │  └─────────────────────┘   └─────────────────────┘         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Conditional writes**: `SET` can refuse to overwrite an existing key
//! - **Lazy expiry**: expired keys are removed by `GET`, there is no sweeper
//! - **Queues**: `QPUSH` appends to the tail, `QPOP` takes the head without
//!   blocking
//!
//! ## Example
//!
//! ```
//! use tidekv::storage::{SetOptions, Store};
//! use std::time::{Duration, Instant};
//!
//! let store = Store::new();
//!
//! let ttl = SetOptions::default().expires_at(Instant::now() + Duration::from_secs(60));
//! store.set("session", "token123", ttl).unwrap();
//! assert_eq!(store.get("session").unwrap(), "token123");
//!
//! store.push("jobs", ["a", "b"]);
//! assert_eq!(store.get_all()["jobs"], "a, b");
//! ```

pub mod entry;
pub mod queue;
pub mod store;

pub use entry::Entry;
pub use store::{SetOptions, Store, StoreError, StoreResult, StoreStats};
