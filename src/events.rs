//! Thread-safe event queue with swap-based draining
//!
//! Producers push events from any thread; the consuming subsystem takes the
//! whole backlog in one swap and iterates it without holding the lock.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// Unbounded multi-producer event queue.
///
/// `drain` swaps the internal buffer for an empty one, so each pushed event
/// is observed by exactly one `drain` or `pop`, never split or duplicated.
pub struct EventQueue<T> {
    inner: Mutex<VecDeque<T>>,
}

impl<T> EventQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Append one event to the back of the queue
    pub fn push(&self, event: T) {
        self.inner.lock().push_back(event);
    }

    /// Splice an externally-owned batch onto the back in one lock acquisition
    pub fn push_all(&self, mut events: VecDeque<T>) {
        self.inner.lock().append(&mut events);
    }

    /// Remove and return the oldest event
    pub fn pop(&self) -> Option<T> {
        self.inner.lock().pop_front()
    }

    /// Take the entire backlog in one swap, leaving the queue empty
    pub fn drain(&self) -> VecDeque<T> {
        std::mem::take(&mut *self.inner.lock())
    }

    /// True when nothing is queued; advisory under concurrent pushes
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Number of queued events; advisory under concurrent pushes
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
