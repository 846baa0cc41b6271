//! Counter snapshots exposed by the frontier and the ingress queue.

use serde::{Deserialize, Serialize};

use crate::job::PRIORITY_BANDS;

/// Point-in-time snapshot of the frontier's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierStats {
    /// Jobs accepted into a ring (including backoff re-releases).
    pub enqueued: u64,
    /// Jobs handed to workers.
    pub dequeued: u64,
    /// Jobs dropped by callers after a full band could not be retried.
    pub dropped: u64,
    /// Jobs dead-lettered.
    pub dead: u64,
    /// Jobs currently in flight.
    pub in_flight: u64,
    /// Jobs currently queued, per band (most urgent first).
    pub by_band: [u64; PRIORITY_BANDS],
}

/// Point-in-time snapshot of the raw ingress queue's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQueueStats {
    /// Candidates accepted into the channel.
    pub enqueued: u64,
    /// Candidates consumed by the normalizer worker.
    pub dequeued: u64,
    /// Candidates dropped (channel closed, timed out, or unparseable).
    pub dropped: u64,
}
