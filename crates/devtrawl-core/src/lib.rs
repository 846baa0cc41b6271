#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod error;
pub mod job;
pub mod meta;
pub mod ports;
pub mod score;
pub mod stats;

// Re-export commonly used types for convenience
pub use config::{ConfigError, FrontierConfig};
pub use error::{FetchError, FrontierError};
pub use job::{DeadLetter, Job, JobId, JobStatus, PRIORITY_BANDS, Priority};
pub use meta::{PageFlags, UrlMeta};
pub use ports::{
    ClockPort, DeadLetterSinkPort, FailureClassifierPort, HttpStatusClassifier, ManualClock,
    NoopDeadLetterSink, SystemClock,
};
pub use score::{apply_aging, score, score_to_priority};
pub use stats::{FrontierStats, RawQueueStats};
