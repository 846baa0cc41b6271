//! Time-ordered holding area for backed-off jobs.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use devtrawl_core::Job;

/// A job waiting out its backoff, plus the context needed to re-enqueue
/// it with aging applied.
#[derive(Debug)]
pub struct DelayedEntry {
    /// The job, `Ready` again.
    pub job: Job,
    /// Instant at which the job becomes eligible.
    pub eligible_at: Instant,
    /// Score recorded at failure time; re-aged at re-enqueue.
    pub score: i64,
    /// When the entry entered the store.
    pub entered_at: Instant,
}

/// Mutex-protected collection of delayed entries.
///
/// One linear scan per tick; the set is small because delays are bounded
/// by the retry budget.
#[derive(Debug, Default)]
pub struct DelayedStore {
    entries: Mutex<Vec<DelayedEntry>>,
}

impl DelayedStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DelayedEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
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

    /// Hold an entry until its deadline.
    pub fn add(&self, entry: DelayedEntry) {
        self.lock().push(entry);
    }

    /// Split off every entry whose deadline has passed. The store never
    /// drops entries itself; the caller owns what happens next.
    pub fn drain_ready(&self, now: Instant) -> Vec<DelayedEntry> {
        let mut entries = self.lock();
        let (ready, remaining): (Vec<_>, Vec<_>) = entries
            .drain(..)
            .partition(|entry| entry.eligible_at <= now);
        *entries = remaining;
        ready
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use devtrawl_core::Priority;

    use super::*;

    fn entry(at: Instant, url: &str) -> DelayedEntry {
        DelayedEntry {
            job: Job::new(url, Priority::P2Normal, 40),
            eligible_at: at,
            score: 40,
            entered_at: at - Duration::from_secs(10),
        }
    }

    #[test]
    fn test_drain_partitions_by_deadline() {
        let store = DelayedStore::new();
        let now = Instant::now();
        store.add(entry(now - Duration::from_secs(1), "https://a.com/"));
        store.add(entry(now + Duration::from_secs(60), "https://b.com/"));
        store.add(entry(now, "https://c.com/"));

        let ready = store.drain_ready(now);
        assert_eq!(ready.len(), 2);
        assert_eq!(store.len(), 1);

        let urls: Vec<&str> = ready.iter().map(|e| e.job.payload.as_str()).collect();
        assert!(urls.contains(&"https://a.com/"));
        assert!(urls.contains(&"https://c.com/"));
    }

    #[test]
    fn test_drain_on_empty_store() {
        let store = DelayedStore::new();
        assert!(store.drain_ready(Instant::now()).is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_entries_survive_until_eligible() {
        let store = DelayedStore::new();
        let now = Instant::now();
        store.add(entry(now + Duration::from_secs(5), "https://a.com/"));

        assert!(store.drain_ready(now).is_empty());
        assert_eq!(store.len(), 1);

        let ready = store.drain_ready(now + Duration::from_secs(5));
        assert_eq!(ready.len(), 1);
        assert!(store.is_empty());
    }
}
