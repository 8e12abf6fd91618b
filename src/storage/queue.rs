//! Per-key FIFO queues.
//!
//! `QPUSH` and `QPOP` operate on the queue slot of an [`Entry`], independent
//! of its scalar value. The two sides lock differently:
//!
//! - **push** holds the store lock exclusively for the whole call. It may
//!   insert a new entry, and exclusive map access already gives it exclusive
//!   access to every queue, so the entry mutex is never touched
//!   ([`parking_lot::Mutex::get_mut`]).
//! - **pop** holds the store lock shared (it never inserts or removes map
//!   entries) and then the entry's own mutex while it takes the head.
//!
//! Pushes to different keys therefore serialize against each other and
//! against every reader. Pops on different keys run in parallel.
//!
//! Pop never blocks waiting for data: an empty or missing queue returns
//! `None` immediately. Draining a queue does not delete its entry.

use crate::storage::entry::Entry;
use crate::storage::store::Store;
use std::sync::atomic::Ordering;
use tracing::{debug, trace};

impl Store {
    /// Appends values to the tail of a key's queue, in call order.
    ///
    /// Creates the entry (empty scalar value, empty queue) if the key is
    /// absent. An existing entry keeps its scalar value and expiry.
    ///
    /// # Returns
    ///
    /// The queue length after the push.
    pub fn push<I, V>(&self, key: impl Into<String>, values: I) -> usize
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.push_count.fetch_add(1, Ordering::Relaxed);

        let key = key.into();
        let mut data = self.data.write();

        let entry = data.entry(key).or_insert_with(Entry::empty);
        let queue = entry.queue.get_mut();
        let before = queue.len();
        queue.extend(values.into_iter().map(Into::into));

        trace!(pushed = queue.len() - before, len = queue.len(), "qpush");
        queue.len()
    }

    /// Removes and returns the head of a key's queue.
    ///
    /// Returns `None` if the key does not exist or its queue is empty. A
    /// missing key is not created.
    pub fn pop(&self, key: &str) -> Option<String> {
        self.pop_count.fetch_add(1, Ordering::Relaxed);

        let data = self.data.read();
        let entry = data.get(key)?;

        let mut queue = entry.queue.lock();
        let value = queue.pop_front();
        if value.is_none() {
            debug!(key = %key, "qpop on empty queue");
        }
        value
    }

    /// Returns the current length of a key's queue (0 if the key is absent).
    pub fn queue_len(&self, key: &str) -> usize {
        let data = self.data.read();
        data.get(key).map(|entry| entry.queue.lock().len()).unwrap_or(0)
    }
}
