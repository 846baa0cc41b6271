//! Bounded append-only log of terminally failed jobs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use devtrawl_core::{DeadLetter, DeadLetterSinkPort};

/// In-memory dead-letter log with drop-oldest overflow, mirrored to a
/// sink hook for hosts that want durability.
pub struct DeadLetterLog {
    entries: Mutex<VecDeque<DeadLetter>>,
    capacity: usize,
    sink: Arc<dyn DeadLetterSinkPort>,
}

impl DeadLetterLog {
    /// Create a log holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize, sink: Arc<dyn DeadLetterSinkPort>) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
            sink,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<DeadLetter>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an entry, dropping the oldest at capacity, and mirror it to
    /// the sink.
    pub fn push(&self, letter: DeadLetter) {
        self.sink.record(&letter);
        let mut entries = self.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(letter);
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current entries, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DeadLetter> {
        self.lock().iter().cloned().collect()
    }
}
