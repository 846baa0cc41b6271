//! The priority frontier.
//!
//! Composes one ring per band with the delayed store, an in-flight table
//! enforcing the visibility timeout, and the dead-letter log. Operations
//! are synchronous and non-blocking; the only task the frontier owns is
//! the runner, which ticks the delayed store and sweeps expired in-flight
//! jobs.
//!
//! # Concurrency model
//!
//! - Rings are lock-free and shared-nothing across bands.
//! - The delayed store, dead-letter log, and in-flight table each sit
//!   behind a short mutex never held across an await.
//! - Counters are plain atomics.

mod backoff;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use devtrawl_core::{
    ClockPort, ConfigError, DeadLetter, DeadLetterSinkPort, FailureClassifierPort, FetchError,
    FrontierConfig, FrontierError, FrontierStats, HttpStatusClassifier, Job, JobId, JobStatus,
    NoopDeadLetterSink, PRIORITY_BANDS, Priority, SystemClock, apply_aging, score_to_priority,
};

use crate::dead_letter::DeadLetterLog;
use crate::delayed::{DelayedEntry, DelayedStore};
use crate::ring::RingBuffer;

pub use backoff::backoff_delay;

/// Ports the frontier consumes; every field has a production default.
pub struct FrontierDeps {
    /// Monotonic time source.
    pub clock: Arc<dyn ClockPort>,
    /// Mirror for dead-letter entries.
    pub dead_letter_sink: Arc<dyn DeadLetterSinkPort>,
    /// Decides which fetch failures are permanent.
    pub failure_classifier: Arc<dyn FailureClassifierPort>,
}

impl Default for FrontierDeps {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock::new()),
            dead_letter_sink: Arc::new(NoopDeadLetterSink::new()),
            failure_classifier: Arc::new(HttpStatusClassifier::new()),
        }
    }
}

/// Error from [`Frontier::enqueue`]; hands the job back to the caller.
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    /// The job's band is at capacity.
    #[error("band {} is full", .0.priority)]
    Full(Job),
    /// The frontier has been shut down.
    #[error("frontier is closed")]
    Closed(Job),
}

impl EnqueueError {
    /// Recover the rejected job.
    #[must_use]
    pub fn into_job(self) -> Job {
        match self {
            Self::Full(job) | Self::Closed(job) => job,
        }
    }

    /// The serializable error kind.
    #[must_use]
    pub fn kind(&self) -> FrontierError {
        match self {
            Self::Full(job) => FrontierError::Full { band: job.priority },
            Self::Closed(_) => FrontierError::Closed,
        }
    }
}

#[derive(Default)]
struct Counters {
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    dropped: AtomicU64,
    dead: AtomicU64,
    stale_reports: AtomicU64,
    by_band: [AtomicU64; PRIORITY_BANDS],
}

struct InFlightEntry {
    job: Job,
    deadline: Instant,
}

/// The multi-priority URL frontier.
///
/// Cheap to share behind an [`Arc`]; every operation takes `&self`.
pub struct Frontier {
    config: FrontierConfig,
    rings: [RingBuffer<Job>; PRIORITY_BANDS],
    delayed: DelayedStore,
    dead: DeadLetterLog,
    in_flight: Mutex<HashMap<JobId, InFlightEntry>>,
    counters: Counters,
    clock: Arc<dyn ClockPort>,
    classifier: Arc<dyn FailureClassifierPort>,
    closed: AtomicBool,
    runner_started: AtomicBool,
    cancel: CancellationToken,
}

impl Frontier {
    /// Build a frontier from configuration with default ports.
    pub fn new(config: FrontierConfig) -> Result<Self, ConfigError> {
        Self::with_deps(config, FrontierDeps::default())
    }

    /// Build a frontier with explicit ports.
    pub fn with_deps(config: FrontierConfig, deps: FrontierDeps) -> Result<Self, ConfigError> {
        config.validate()?;
        let rings = [
            Self::band_ring(&config, Priority::P0Urgent)?,
            Self::band_ring(&config, Priority::P1High)?,
            Self::band_ring(&config, Priority::P2Normal)?,
            Self::band_ring(&config, Priority::P3Low)?,
        ];
        Ok(Self {
            dead: DeadLetterLog::new(config.dead_letter_capacity, deps.dead_letter_sink),
            config,
            rings,
            delayed: DelayedStore::new(),
            in_flight: Mutex::new(HashMap::new()),
            counters: Counters::default(),
            clock: deps.clock,
            classifier: deps.failure_classifier,
            closed: AtomicBool::new(false),
            runner_started: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        })
    }

    fn band_ring(
        config: &FrontierConfig,
        band: Priority,
    ) -> Result<RingBuffer<Job>, ConfigError> {
        let capacity = config.band_capacities[band.index()];
        RingBuffer::with_capacity(capacity).map_err(|err| ConfigError::CapacityNotPowerOfTwo {
            band,
            capacity: err.0,
        })
    }

    /// Start the runner driving the delayed tick and the visibility
    /// sweep. Idempotent; requires a tokio runtime.
    pub fn start(self: &Arc<Self>) {
        if self
            .runner_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let frontier = Arc::clone(self);
            tokio::spawn(async move {
                frontier.run_loop().await;
            });
        }
    }

    async fn run_loop(&self) {
        let mut ticker = tokio::time::interval(self.config.delayed_tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                _ = ticker.tick() => self.tick(),
            }
        }
        tracing::debug!(target: "devtrawl.frontier", "runner stopped");
    }

    /// Run one maintenance pass: release elapsed backoffs and reclaim
    /// expired in-flight jobs. Normally driven by the runner.
    pub fn tick(&self) {
        self.release_delayed();
        self.sweep_in_flight();
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<JobId, InFlightEntry>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a ready job into its band's ring.
    pub fn enqueue(&self, job: Job) -> Result<(), EnqueueError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EnqueueError::Closed(job));
        }
        self.push_to_ring(job).map_err(EnqueueError::Full)
    }

    fn push_to_ring(&self, job: Job) -> Result<(), Job> {
        let band = job.priority;
        self.rings[band.index()].push(job)?;
        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
        self.counters.by_band[band.index()].fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Pull the most urgent ready job, marking it in flight until the
    /// visibility deadline.
    pub fn pull(&self) -> Option<Job> {
        for (index, ring) in self.rings.iter().enumerate() {
            if let Some(mut job) = ring.pop() {
                self.counters.dequeued.fetch_add(1, Ordering::Relaxed);
                self.counters.by_band[index].fetch_sub(1, Ordering::Relaxed);

                let deadline = self.clock.now() + self.config.visibility_timeout;
                job.status = JobStatus::InFlight;
                job.visibility_deadline = Some(deadline);
                self.lock_in_flight().insert(
                    job.id.clone(),
                    InFlightEntry {
                        job: job.clone(),
                        deadline,
                    },
                );
                return Some(job);
            }
        }
        None
    }

    /// Report successful completion; the job is dropped.
    pub fn complete(&self, job: Job) {
        if self.lock_in_flight().remove(&job.id).is_none() {
            self.note_stale(&job.id, "completion");
            return;
        }
        tracing::debug!(target: "devtrawl.frontier", job = %job.id, "completed");
    }

    /// Report a failure for an in-flight job. `score` is the job's base
    /// score as the caller knows it; demotion derives from it and the
    /// retry count.
    pub fn fail(&self, job: Job, error: &FetchError, score: i64) {
        if self.lock_in_flight().remove(&job.id).is_none() {
            self.note_stale(&job.id, "failure");
            return;
        }
        self.fail_inner(job, error, score);
    }

    /// The retry policy, past the in-flight lease check.
    fn fail_inner(&self, mut job: Job, error: &FetchError, score: i64) {
        if self.classifier.is_permanent(error) {
            self.bury(job, format!("permanent: {error}"));
            return;
        }

        job.retry_count += 1;
        if job.retry_count > self.config.max_retries {
            self.bury(
                job,
                format!("retries exhausted after {}: {error}", self.config.max_retries),
            );
            return;
        }

        let now = self.clock.now();
        let delay = backoff_delay(
            self.config.base_backoff,
            job.retry_count,
            &mut rand::thread_rng(),
        );
        let demoted = score - 10 * i64::from(job.retry_count);
        // max() picks the less urgent band: never promoted on failure.
        job.priority = score_to_priority(demoted).max(job.priority);
        job.score = demoted;
        job.status = JobStatus::Ready;
        job.visibility_deadline = Some(now + delay);

        tracing::debug!(
            target: "devtrawl.frontier",
            job = %job.id,
            retry = job.retry_count,
            band = %job.priority,
            delay_ms = delay.as_millis() as u64,
            "scheduled for retry"
        );
        self.delayed.add(DelayedEntry {
            job,
            eligible_at: now + delay,
            score: demoted,
            entered_at: now,
        });
    }

    fn bury(&self, mut job: Job, reason: String) {
        job.status = JobStatus::Dead;
        self.counters.dead.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            target: "devtrawl.frontier",
            job = %job.id,
            url = %job.payload,
            %reason,
            "dead-lettered"
        );
        self.dead.push(DeadLetter {
            job,
            reason,
            failed_at: chrono::Utc::now(),
        });
    }

    fn note_stale(&self, id: &JobId, what: &str) {
        self.counters.stale_reports.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            target: "devtrawl.frontier",
            job = %id,
            "{what} for a job no longer in flight (reclaimed or duplicate)"
        );
    }

    /// Move every delayed entry whose backoff elapsed back into its ring,
    /// reapplying aging over the time actually waited.
    fn release_delayed(&self) {
        let now = self.clock.now();
        for entry in self.delayed.drain_ready(now) {
            let DelayedEntry {
                mut job,
                eligible_at,
                score,
                entered_at,
            } = entry;

            let waited = now.saturating_duration_since(entered_at);
            let aged = apply_aging(score, waited);
            // Aging may climb back toward the initial band, never past it.
            job.priority = score_to_priority(aged).max(job.initial_priority);
            job.score = aged;

            if let Err(job) = self.push_to_ring(job) {
                // Ring full: hold the entry with its original deadline.
                self.delayed.add(DelayedEntry {
                    job,
                    eligible_at,
                    score,
                    entered_at,
                });
            }
        }
    }

    /// Fail every in-flight job whose visibility deadline has passed, as
    /// if its worker had reported a timeout.
    fn sweep_in_flight(&self) {
        let now = self.clock.now();
        let expired: Vec<InFlightEntry> = {
            let mut table = self.lock_in_flight();
            let ids: Vec<JobId> = table
                .iter()
                .filter(|(_, entry)| entry.deadline <= now)
                .map(|(id, _)| id.clone())
                .collect();
            ids.iter().filter_map(|id| table.remove(id)).collect()
        };
        for entry in expired {
            tracing::warn!(
                target: "devtrawl.frontier",
                job = %entry.job.id,
                url = %entry.job.payload,
                "visibility deadline passed; reclaiming"
            );
            let score = entry.job.score;
            self.fail_inner(entry.job, &FetchError::Timeout, score);
        }
    }

    /// Idempotent shutdown: stops the runner; later enqueues fail with
    /// `Closed`.
    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.cancel.cancel();
            tracing::info!(target: "devtrawl.frontier", "shut down");
        }
    }

    /// Whether [`Frontier::shutdown`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Point-in-time counter snapshot.
    #[must_use]
    pub fn stats(&self) -> FrontierStats {
        FrontierStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dequeued: self.counters.dequeued.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            dead: self.counters.dead.load(Ordering::Relaxed),
            in_flight: self.lock_in_flight().len() as u64,
            by_band: [
                self.counters.by_band[0].load(Ordering::Relaxed),
                self.counters.by_band[1].load(Ordering::Relaxed),
                self.counters.by_band[2].load(Ordering::Relaxed),
                self.counters.by_band[3].load(Ordering::Relaxed),
            ],
        }
    }

    /// Count a job the caller dropped after giving up on a full band.
    pub fn note_dropped(&self) {
        self.counters.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Entries currently in the dead-letter log, oldest first.
    #[must_use]
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead.snapshot()
    }

    /// Number of jobs waiting out a backoff.
    #[must_use]
    pub fn delayed_len(&self) -> usize {
        self.delayed.len()
    }
}

impl Drop for Frontier {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
