//! Core job types for the frontier.
//!
//! Pure data types with no I/O dependencies. Jobs are created by the
//! ingress worker and mutated only by the frontier and the delayed store.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of priority bands. Band arrays throughout the workspace are
/// indexed by [`Priority::index`].
pub const PRIORITY_BANDS: usize = 4;

/// Stable identifier for a frontier job.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Allocate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// View the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JobId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

/// Urgency band of a job.
///
/// Bands fully order pull precedence: `P0Urgent` is drained before any
/// lower band is inspected. The derived `Ord` runs from most urgent to
/// least urgent, so `a.max(b)` picks the *less* urgent of the two — the
/// direction demotion clamps in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Rare, urgent work; drained first.
    P0Urgent,
    /// Fresh discovery.
    P1High,
    /// Main workload.
    P2Normal,
    /// Recrawls and background bulk.
    P3Low,
}

impl Priority {
    /// All bands, most urgent first.
    pub const ALL: [Self; PRIORITY_BANDS] = [
        Self::P0Urgent,
        Self::P1High,
        Self::P2Normal,
        Self::P3Low,
    ];

    /// Position of this band in band-indexed arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::P0Urgent => 0,
            Self::P1High => 1,
            Self::P2Normal => 2,
            Self::P3Low => 3,
        }
    }

    /// Inverse of [`Priority::index`].
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::P0Urgent),
            1 => Some(Self::P1High),
            2 => Some(Self::P2Normal),
            3 => Some(Self::P3Low),
            _ => None,
        }
    }

    /// String representation used in logs and snapshots.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P0Urgent => "p0_urgent",
            Self::P1High => "p1_high",
            Self::P2Normal => "p2_normal",
            Self::P3Low => "p3_low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting in a ring or in the delayed store.
    Ready,
    /// Handed to a worker; must be completed or failed before the
    /// visibility deadline.
    InFlight,
    /// Completed successfully; about to be dropped.
    Done,
    /// Terminally failed; resting in the dead-letter log.
    Dead,
}

impl JobStatus {
    /// String representation used in logs and snapshots.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::InFlight => "in_flight",
            Self::Done => "done",
            Self::Dead => "dead",
        }
    }
}

/// The unit of work handed between the ingress worker, the frontier, and
/// fetch workers.
#[derive(Clone, Debug)]
pub struct Job {
    /// Stable identifier.
    pub id: JobId,
    /// Canonical URL produced by the normalization pipeline.
    pub payload: String,
    /// Current urgency band.
    pub priority: Priority,
    /// Band assigned at creation. Retries may demote `priority` below
    /// this; re-enqueue aging may raise it back, never past it.
    pub initial_priority: Priority,
    /// Lifecycle status.
    pub status: JobStatus,
    /// Deadline by which an in-flight job must be completed or failed;
    /// doubles as the eligibility instant while the job waits out a
    /// backoff in the delayed store.
    pub visibility_deadline: Option<Instant>,
    /// Number of transient failures so far.
    pub retry_count: u32,
    /// Relevance score computed at ingress and demoted on failure.
    pub score: i64,
}

impl Job {
    /// Create a ready job with a freshly allocated identifier.
    #[must_use]
    pub fn new(payload: impl Into<String>, priority: Priority, score: i64) -> Self {
        Self {
            id: JobId::generate(),
            payload: payload.into(),
            priority,
            initial_priority: priority,
            status: JobStatus::Ready,
            visibility_deadline: None,
            retry_count: 0,
            score,
        }
    }
}

/// A job that reached a terminal failure, plus why.
#[derive(Clone, Debug)]
pub struct DeadLetter {
    /// The job, with `status == Dead`.
    pub job: Job,
    /// Description of the terminal error.
    pub reason: String,
    /// Wall-clock time the job was dead-lettered.
    pub failed_at: DateTime<Utc>,
}
