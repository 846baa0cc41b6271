//! Ingress: the raw-candidate channel and the normalizer worker.
//!
//! Producers (seed loaders, the link extractor) push raw URL strings with
//! their discovery context into the bounded [`RawQueue`]. The
//! [`IngressWorker`] drains it, canonicalizes each URL, assembles
//! metadata, scores it, and enqueues a job into the frontier. The channel
//! is one-shot for the frontier's lifetime: once every producer handle is
//! dropped the worker drains what is left and exits.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use devtrawl_core::{Job, PageFlags, RawQueueStats, UrlMeta, score, score_to_priority};
use devtrawl_normalize::{HostClass, Url, normalize_parsed};

use crate::frontier::{EnqueueError, Frontier};

/// How long a single [`RawQueue::add`] waits for channel space.
const ADD_TIMEOUT: Duration = Duration::from_secs(2);
/// Pause between retries against a full band.
const FULL_RETRY_PAUSE: Duration = Duration::from_millis(10);
/// Retries against a full band before the candidate is dropped.
const FULL_RETRY_LIMIT: u32 = 50;

/// Discovery context supplied by whatever found the link.
///
/// The frontier cannot see page content; content-derived hints travel
/// with the candidate instead.
#[derive(Clone, Debug, Default)]
pub struct DiscoveryContext {
    /// Crawl depth from the nearest seed.
    pub depth: u32,
    /// URL of the page the link was found on.
    pub discovered_from: Option<String>,
    /// Inbound links seen so far.
    pub inbound_links: u32,
    /// The target looks like a specification.
    pub is_spec: bool,
    /// The target looks like a blog post.
    pub is_blog: bool,
    /// This is a recrawl of a previously fetched page.
    pub is_recrawl: bool,
    /// The referring snippet contained code blocks.
    pub has_code_blocks: bool,
    /// Word count of the referring snippet.
    pub word_count: u64,
    /// Content-type hint when the extractor knows better than the path
    /// extension.
    pub content_type_hint: Option<String>,
    /// Last successful fetch, for recrawl candidates.
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// A raw URL plus its discovery context, as carried by the ingress
/// channel.
#[derive(Clone, Debug)]
pub struct RawCandidate {
    /// The raw URL string, not yet normalized.
    pub url: String,
    /// Where and how it was discovered.
    pub context: DiscoveryContext,
}

impl RawCandidate {
    /// Candidate with no discovery context (a seed URL).
    #[must_use]
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            context: DiscoveryContext::default(),
        }
    }
}

#[derive(Debug, Default)]
struct RawCounters {
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    dropped: AtomicU64,
}

/// Error adding to the raw queue.
#[derive(Clone, Copy, Debug, thiserror::Error, PartialEq, Eq)]
pub enum RawQueueError {
    /// Every consumer is gone; the channel cannot be reopened.
    #[error("raw queue is closed")]
    Closed,
    /// No space became available within the add timeout.
    #[error("timed out waiting for raw queue space")]
    Timeout,
}

/// Producer handle for the bounded ingress channel.
#[derive(Clone)]
pub struct RawQueue {
    tx: mpsc::Sender<RawCandidate>,
    counters: Arc<RawCounters>,
}

/// Consumer half, handed to the ingress worker.
pub struct RawReceiver {
    rx: mpsc::Receiver<RawCandidate>,
    counters: Arc<RawCounters>,
}

impl RawQueue {
    /// Create the bounded channel; returns the producer handle and the
    /// consumer half.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, RawReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        let counters = Arc::new(RawCounters::default());
        (
            Self {
                tx,
                counters: Arc::clone(&counters),
            },
            RawReceiver { rx, counters },
        )
    }

    /// Add one candidate, waiting up to two seconds for space.
    pub async fn add(&self, candidate: RawCandidate) -> Result<(), RawQueueError> {
        match tokio::time::timeout(ADD_TIMEOUT, self.tx.send(candidate)).await {
            Ok(Ok(())) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Ok(Err(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                Err(RawQueueError::Closed)
            }
            Err(_) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                Err(RawQueueError::Timeout)
            }
        }
    }

    /// Add a batch of candidates; returns how many were added and how
    /// many failed.
    pub async fn add_all(
        &self,
        candidates: impl IntoIterator<Item = RawCandidate>,
    ) -> (usize, usize) {
        let mut added = 0;
        let mut failed = 0;
        for candidate in candidates {
            let url = candidate.url.clone();
            match self.add(candidate).await {
                Ok(()) => added += 1,
                Err(err) => {
                    tracing::warn!(
                        target: "devtrawl.ingress",
                        %url,
                        error = %err,
                        "failed to add candidate"
                    );
                    failed += 1;
                }
            }
        }
        (added, failed)
    }

    /// Point-in-time counter snapshot.
    #[must_use]
    pub fn stats(&self) -> RawQueueStats {
        RawQueueStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dequeued: self.counters.dequeued.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    /// Drop this producer handle. The channel closes once every clone is
    /// gone, and the worker exits after draining.
    pub fn close(self) {
        drop(self);
    }
}

/// The normalizer worker: raw candidate in, scored canonical job out.
pub struct IngressWorker {
    frontier: Arc<Frontier>,
    cancel: CancellationToken,
}

impl IngressWorker {
    /// Create a worker feeding `frontier`, stopping on `cancel`.
    #[must_use]
    pub fn new(frontier: Arc<Frontier>, cancel: CancellationToken) -> Self {
        Self { frontier, cancel }
    }

    /// Run until cancelled or the channel closes. Finishes the candidate
    /// in hand before exiting.
    pub async fn run(self, mut rx: RawReceiver) {
        loop {
            let candidate = tokio::select! {
                () = self.cancel.cancelled() => break,
                received = rx.rx.recv() => match received {
                    Some(candidate) => candidate,
                    None => break,
                },
            };
            rx.counters.dequeued.fetch_add(1, Ordering::Relaxed);
            if !self.process(candidate).await {
                rx.counters.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
        tracing::debug!(target: "devtrawl.ingress", "worker stopped");
    }

    /// Normalize, score, and enqueue one candidate. Returns whether the
    /// candidate made it into the frontier.
    async fn process(&self, candidate: RawCandidate) -> bool {
        let (url, class) = match normalize_parsed(&candidate.url) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!(
                    target: "devtrawl.ingress",
                    url = %candidate.url,
                    error = %err,
                    "dropping unparseable url"
                );
                return false;
            }
        };

        let now = Utc::now();
        let meta = build_meta(&url, class, &candidate.context, now);
        let score = score(&meta, now);
        let priority = score_to_priority(score);
        let mut job = Job::new(meta.url.clone(), priority, score);

        tracing::trace!(
            target: "devtrawl.ingress",
            url = %job.payload,
            %priority,
            score,
            "enqueueing"
        );

        for _ in 0..FULL_RETRY_LIMIT {
            match self.frontier.enqueue(job) {
                Ok(()) => return true,
                Err(EnqueueError::Closed(_)) => {
                    tracing::debug!(target: "devtrawl.ingress", "frontier closed; dropping");
                    return false;
                }
                Err(EnqueueError::Full(returned)) => {
                    job = returned;
                    tokio::time::sleep(FULL_RETRY_PAUSE).await;
                }
            }
        }

        self.frontier.note_dropped();
        tracing::warn!(
            target: "devtrawl.ingress",
            url = %job.payload,
            band = %job.priority,
            "band stayed full; dropping"
        );
        false
    }
}

/// Assemble immutable metadata for a canonical URL.
#[must_use]
pub fn build_meta(
    url: &Url,
    class: HostClass,
    context: &DiscoveryContext,
    now: DateTime<Utc>,
) -> UrlMeta {
    let host = url.host_str().unwrap_or_default().to_owned();
    let path = url.path().to_owned();

    let mut flags = PageFlags::empty();
    if class == HostClass::Docs {
        flags |= PageFlags::DOCS;
    }
    if host.starts_with("api.") || path.to_lowercase().contains("/api/") {
        flags |= PageFlags::API;
    }
    if context.is_spec {
        flags |= PageFlags::SPEC;
    }
    if context.is_blog {
        flags |= PageFlags::BLOG;
    }
    if context.is_recrawl {
        flags |= PageFlags::RECRAWL;
    }
    if context.has_code_blocks {
        flags |= PageFlags::HAS_CODE_BLOCKS;
    }
    if url.query().is_some() {
        flags |= PageFlags::HAS_QUERY_PARAMS;
    }

    let content_type = context
        .content_type_hint
        .clone()
        .or_else(|| extension_hint(&path));

    UrlMeta {
        url: url.as_str().to_owned(),
        host,
        path,
        depth: context.depth,
        discovered_from: context.discovered_from.clone(),
        inbound_links: context.inbound_links,
        content_type,
        word_count: context.word_count,
        flags,
        first_seen_at: now,
        last_fetched_at: context.last_fetched_at,
    }
}

/// Content-type hint from the final path extension, if it has one.
fn extension_hint(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let (stem, extension) = segment.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() || extension.len() > 5 {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}
