//! Bounded hand-off channel of canonical URLs toward the HTTP fetcher.
//!
//! Fetch workers push here after [`crate::Frontier::pull`]; the fetcher
//! (external) consumes until end-of-stream. Backpressure from fetch
//! throughput propagates to the workers through the bounded capacity.

use thiserror::Error;
use tokio::sync::mpsc;

/// Default capacity of the fetch channel.
pub const DEFAULT_FETCH_CAPACITY: usize = 100;

/// The consumer side has gone away.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("fetch queue is closed")]
pub struct FetchQueueClosed;

/// Producer half of the fetch channel.
#[derive(Clone)]
pub struct FetchQueue {
    tx: mpsc::Sender<String>,
}

/// Consumer half of the fetch channel.
pub struct FetchReceiver {
    rx: mpsc::Receiver<String>,
}

impl FetchQueue {
    /// Create the bounded channel; returns producer and consumer halves.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, FetchReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, FetchReceiver { rx })
    }

    /// Create a channel with [`DEFAULT_FETCH_CAPACITY`].
    #[must_use]
    pub fn with_default_capacity() -> (Self, FetchReceiver) {
        Self::new(DEFAULT_FETCH_CAPACITY)
    }

    /// Send one canonical URL, waiting while the fetcher is behind.
    pub async fn send(&self, url: String) -> Result<(), FetchQueueClosed> {
        self.tx.send(url).await.map_err(|_| FetchQueueClosed)
    }

    /// Drop this producer handle. The fetcher observes end-of-stream once
    /// every clone is gone.
    pub fn close(self) {
        drop(self);
    }
}

impl FetchReceiver {
    /// Receive the next canonical URL; `None` means end-of-stream.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}
