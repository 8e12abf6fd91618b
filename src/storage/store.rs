//! Thread-Safe Key-Value Store with Lazy Expiry
//!
//! This module implements the core store for TideKV: a single map from key to
//! [`Entry`] behind one store-wide reader/writer lock.
//!
//! ## Design Decisions
//!
//! 1. **One map lock**: `SET` and `QPUSH` take it exclusively, `GET`, `GETALL`
//!    and `QPOP` take it shared.
//! 2. **Per-entry queue lock**: `QPOP` mutates a queue while the map is only
//!    shared, so each entry's queue has its own mutex.
//! 3. **Lazy expiry only**: expired keys are removed by `GET` and nothing else.
//!    Until then they stay resident and show up in `GETALL`.
//!
//! ## Lock Ordering
//!
//! ```text
//!   store lock (RwLock<HashMap>)  ──then──>  entry.queue (Mutex)
//! ```
//!
//! The store lock is always taken first and is never requested while an entry
//! lock is held.

use crate::storage::entry::Entry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Errors returned by store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The supplied expiry is not strictly in the future
    #[error("invalid expiry time")]
    InvalidExpiry,

    /// A guarded write found the key already present
    #[error("key already exists: {0}")]
    AlreadyExists(String),

    /// The key is absent, or was present but has expired
    #[error("key not found: {0}")]
    NotFound(String),

    /// Unexpected failure inside the store
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Options for [`Store::set`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Absolute expiry instant (None = never expires)
    pub expires_at: Option<Instant>,
    /// Reject the write with [`StoreError::AlreadyExists`] if the key is present
    pub reject_if_exists: bool,
}

impl SetOptions {
    /// Sets the absolute expiry instant.
    pub fn expires_at(mut self, at: Instant) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Enables the reject-if-exists guard.
    pub fn reject_if_exists(mut self) -> Self {
        self.reject_if_exists = true;
        self
    }
}

/// The TideKV store.
///
/// Designed to be wrapped in an `Arc` and shared by every connection task.
/// All operations are synchronous and all-or-nothing.
///
/// # Example
///
/// ```
/// use tidekv::storage::{SetOptions, Store, StoreError};
///
/// let store = Store::new();
/// store.set("name", "Ariz", SetOptions::default()).unwrap();
/// assert_eq!(store.get("name").unwrap(), "Ariz");
///
/// let guarded = SetOptions::default().reject_if_exists();
/// assert_eq!(
///     store.set("name", "other", guarded),
///     Err(StoreError::AlreadyExists("name".into()))
/// );
///
/// store.push("jobs", ["a", "b"]);
/// assert_eq!(store.pop("jobs").as_deref(), Some("a"));
/// ```
pub struct Store {
    /// Key to entry map, guarded by the store-wide lock
    pub(crate) data: RwLock<HashMap<String, Entry>>,

    /// Statistics: total GET operations
    get_count: AtomicU64,

    /// Statistics: total successful SET operations
    set_count: AtomicU64,

    /// Statistics: total QPUSH operations
    pub(crate) push_count: AtomicU64,

    /// Statistics: total QPOP operations
    pub(crate) pop_count: AtomicU64,

    /// Statistics: number of expired keys evicted by GET
    expired_count: AtomicU64,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("keys", &self.data.read().len())
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("set_count", &self.set_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            push_count: AtomicU64::new(0),
            pop_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    /// Sets a key to a scalar value, replacing any existing entry wholesale.
    ///
    /// The replaced entry's queue is discarded along with its value and
    /// expiry.
    ///
    /// # Errors
    ///
    /// - [`StoreError::AlreadyExists`] if `options.reject_if_exists` is set and
    ///   the key is present. Checked first. An expired key that no `GET` has
    ///   evicted yet still counts as present.
    /// - [`StoreError::InvalidExpiry`] if `options.expires_at` is not strictly
    ///   after now. Nothing is stored.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        options: SetOptions,
    ) -> StoreResult<()> {
        let key = key.into();
        let mut data = self.data.write();

        if options.reject_if_exists && data.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }

        if let Some(at) = options.expires_at {
            if at <= Instant::now() {
                return Err(StoreError::InvalidExpiry);
            }
        }

        debug!(key = %key, ttl = options.expires_at.is_some(), "set");
        data.insert(key, Entry::new(value.into(), options.expires_at));
        self.set_count.fetch_add(1, Ordering::Relaxed);

        Ok(())
    }

    /// Gets the scalar value for a key.
    ///
    /// Queue-only keys return an empty string. This is the only operation that
    /// evicts expired entries.
    pub fn get(&self, key: &str) -> StoreResult<String> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        // Fast path under the shared lock
        {
            let data = self.data.read();
            match data.get(key) {
                None => return Err(StoreError::NotFound(key.to_string())),
                Some(entry) if !entry.is_expired() => return Ok(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Expired: re-acquire exclusively and check again, another writer may
        // have replaced or removed the entry in between
        let mut data = self.data.write();
        match data.get(key) {
            Some(entry) if entry.is_expired() => {
                data.remove(key);
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "evicted expired key");
                Err(StoreError::NotFound(key.to_string()))
            }
            Some(entry) => Ok(entry.value.clone()),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    /// Returns a snapshot of every key and its display value.
    ///
    /// Keys with a non-empty queue show the queue joined with `", "`; the rest
    /// show their scalar value. Expired entries are not filtered or evicted.
    pub fn get_all(&self) -> HashMap<String, String> {
        let data = self.data.read();
        data.iter()
            .map(|(key, entry)| (key.clone(), entry.display_value()))
            .collect()
    }

    /// Returns the number of resident keys, including expired ones not yet
    /// evicted.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            keys: self.len() as u64,
            get_ops: self.get_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            push_ops: self.push_count.load(Ordering::Relaxed),
            pop_ops: self.pop_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

/// Store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of resident keys
    pub keys: u64,
    /// Total GET operations
    pub get_ops: u64,
    /// Total successful SET operations
    pub set_ops: u64,
    /// Total QPUSH operations
    pub push_ops: u64,
    /// Total QPOP operations
    pub pop_ops: u64,
    /// Expired keys evicted by GET
    pub expired: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_get_never_written() {
        let store = Store::new();
        assert_eq!(
            store.get("missing"),
            Err(StoreError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_set_and_get() {
        let store = Store::new();
        store.set("key", "value", SetOptions::default()).unwrap();
        assert_eq!(store.get("key").unwrap(), "value");
    }

    #[test]
    fn test_set_overwrites() {
        let store = Store::new();
        store.set("key", "v1", SetOptions::default()).unwrap();
        store.set("key", "v2", SetOptions::default()).unwrap();
        assert_eq!(store.get("key").unwrap(), "v2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_guarded_set_rejects_existing_key() {
        let store = Store::new();
        store.set("key", "v1", SetOptions::default()).unwrap();

        let result = store.set("key", "v2", SetOptions::default().reject_if_exists());
        assert_eq!(result, Err(StoreError::AlreadyExists("key".to_string())));

        // Rejected write leaves the entry untouched
        assert_eq!(store.get("key").unwrap(), "v1");
    }

    #[test]
    fn test_guarded_set_on_absent_key() {
        let store = Store::new();
        store
            .set("key", "v1", SetOptions::default().reject_if_exists())
            .unwrap();
        assert_eq!(store.get("key").unwrap(), "v1");
    }

    #[test]
    fn test_guarded_set_rejects_queue_only_key() {
        let store = Store::new();
        store.push("q", ["a"]);

        let result = store.set("q", "v", SetOptions::default().reject_if_exists());
        assert_eq!(result, Err(StoreError::AlreadyExists("q".to_string())));
        assert_eq!(store.pop("q").as_deref(), Some("a"));
    }

    #[test]
    fn test_past_expiry_is_rejected() {
        let store = Store::new();
        let past = Instant::now() - Duration::from_secs(10);

        let result = store.set("key", "value", SetOptions::default().expires_at(past));
        assert_eq!(result, Err(StoreError::InvalidExpiry));

        // Nothing was stored
        assert!(matches!(store.get("key"), Err(StoreError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_guard_checked_before_invalid_expiry() {
        let store = Store::new();
        store.set("key", "v1", SetOptions::default()).unwrap();

        let past = Instant::now() - Duration::from_secs(10);
        let options = SetOptions::default().expires_at(past).reject_if_exists();
        assert_eq!(
            store.set("key", "v2", options),
            Err(StoreError::AlreadyExists("key".into()))
        );
        assert_eq!(store.get("key").unwrap(), "v1");

        // Absent key: the guard passes and the expiry is rejected
        assert_eq!(store.set("other", "v", options), Err(StoreError::InvalidExpiry));
        assert!(store.get("other").is_err());
    }

    #[test]
    fn test_lazy_expiry() {
        let store = Store::new();
        let at = Instant::now() + Duration::from_millis(50);
        store
            .set("key", "value", SetOptions::default().expires_at(at))
            .unwrap();

        assert_eq!(store.get("key").unwrap(), "value");

        std::thread::sleep(Duration::from_millis(100));

        // Still resident (and visible as stale data) until read
        assert_eq!(store.get_all().get("key").map(String::as_str), Some("value"));

        assert!(matches!(store.get("key"), Err(StoreError::NotFound(_))));
        assert!(!store.get_all().contains_key("key"));
        assert_eq!(store.stats().expired, 1);
    }

    #[test]
    fn test_expired_key_blocks_guarded_set_until_evicted() {
        let store = Store::new();
        let at = Instant::now() + Duration::from_millis(20);
        store
            .set("key", "old", SetOptions::default().expires_at(at))
            .unwrap();
        std::thread::sleep(Duration::from_millis(50));

        let guarded = SetOptions::default().reject_if_exists();
        assert!(matches!(
            store.set("key", "new", guarded),
            Err(StoreError::AlreadyExists(_))
        ));

        assert!(store.get("key").is_err());
        store.set("key", "new", guarded).unwrap();
        assert_eq!(store.get("key").unwrap(), "new");
    }

    #[test]
    fn test_set_discards_existing_queue() {
        let store = Store::new();
        store.push("key", ["a", "b"]);
        store.set("key", "scalar", SetOptions::default()).unwrap();

        assert_eq!(store.pop("key"), None);
        assert_eq!(store.get_all().get("key").map(String::as_str), Some("scalar"));
    }

    #[test]
    fn test_get_all_display_values() {
        let store = Store::new();
        store.push("q", ["a", "b"]);
        store.set("s", "hello", SetOptions::default()).unwrap();

        let all = store.get_all();
        let expected: HashMap<String, String> = [
            ("q".to_string(), "a, b".to_string()),
            ("s".to_string(), "hello".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_get_all_empty() {
        let store = Store::new();
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn test_stats() {
        let store = Store::new();
        store.set("a", "1", SetOptions::default()).unwrap();
        let _ = store.set("a", "2", SetOptions::default().reject_if_exists());
        let _ = store.get("a");
        let _ = store.get("b");
        store.push("q", ["x"]);
        store.pop("q");
        store.pop("q");

        let stats = store.stats();
        assert_eq!(stats.keys, 2);
        assert_eq!(stats.set_ops, 1);
        assert_eq!(stats.get_ops, 2);
        assert_eq!(stats.push_ops, 1);
        assert_eq!(stats.pop_ops, 2);
        assert_eq!(stats.expired, 0);
    }

    #[test]
    fn test_concurrent_set_get() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(Store::new());
        let mut handles = vec![];

        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key-{}-{}", i, j);
                    store.set(key.as_str(), "value", SetOptions::default()).unwrap();
                    assert_eq!(store.get(&key).unwrap(), "value");
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 800);
    }

    #[test]
    fn test_concurrent_guarded_set_has_single_winner() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(Store::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .set("lock", i.to_string(), SetOptions::default().reject_if_exists())
                        .is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
