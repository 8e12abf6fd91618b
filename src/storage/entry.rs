//! Per-key records.
//!
//! An [`Entry`] carries two independent capabilities at once: a scalar string
//! value (with an optional expiry) and a FIFO queue. A key that was only ever
//! pushed to has an empty scalar value; a key that was only ever `SET` has an
//! empty queue.
//!
//! ## Locking
//!
//! The queue sits behind its own [`Mutex`] so that `QPOP` can mutate it while
//! the store map is only held in shared mode. Everything else on the entry is
//! guarded by the store-wide lock.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Instant;

/// Separator used when a queue is rendered as a single display string.
pub const QUEUE_DISPLAY_SEPARATOR: &str = ", ";

/// A stored record: scalar value, optional expiry and a FIFO queue.
#[derive(Debug, Default)]
pub struct Entry {
    /// The scalar value (empty for queue-only keys)
    pub value: String,
    /// When the scalar value expires (None = never expires)
    pub expires_at: Option<Instant>,
    /// Pending queue items, head at the front
    pub queue: Mutex<VecDeque<String>>,
}

impl Entry {
    /// Creates a scalar entry with an optional expiry and an empty queue.
    pub fn new(value: String, expires_at: Option<Instant>) -> Self {
        Self {
            value,
            expires_at,
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Creates the record a first `QPUSH` lands in.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Checks if this entry has expired.
    ///
    /// An entry is expired once `now` is strictly past its expiry instant.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    #[inline]
    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.map(|exp| now > exp).unwrap_or(false)
    }

    /// Returns the value `GETALL` shows for this key.
    ///
    /// A non-empty queue wins over the scalar value.
    pub fn display_value(&self) -> String {
        let queue = self.queue.lock();
        if queue.is_empty() {
            self.value.clone()
        } else {
            queue
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(QUEUE_DISPLAY_SEPARATOR)
        }
    }
}
