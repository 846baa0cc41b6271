#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod dead_letter;
pub mod delayed;
pub mod fetch;
pub mod frontier;
pub mod ingress;
#[allow(unsafe_code)]
pub mod ring;

// Re-export core types for convenience
pub use devtrawl_core::{
    ConfigError, DeadLetter, FetchError, FrontierConfig, FrontierError, FrontierStats, Job, JobId,
    JobStatus, Priority, RawQueueStats, UrlMeta,
};

pub use dead_letter::DeadLetterLog;
pub use delayed::{DelayedEntry, DelayedStore};
pub use fetch::{FetchQueue, FetchQueueClosed, FetchReceiver};
pub use frontier::{EnqueueError, Frontier, FrontierDeps, backoff_delay};
pub use ingress::{
    DiscoveryContext, IngressWorker, RawCandidate, RawQueue, RawQueueError, RawReceiver,
};
pub use ring::{RingBuffer, RingCapacityError};
