//! Error taxonomy for the frontier surface.
//!
//! These errors are designed to be serializable and cheap to clone;
//! failures originating in external fetchers are captured as strings
//! rather than wrapping transport error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::Priority;

/// Error surfaced by frontier operations.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrontierError {
    /// The target band's ring is at capacity.
    #[error("band {band} is full")]
    Full {
        /// The band that rejected the job.
        band: Priority,
    },

    /// The frontier has been shut down.
    #[error("frontier is closed")]
    Closed,
}

/// Failure reported by a fetch worker for an in-flight job.
///
/// The frontier never produces these itself except for the synthetic
/// [`FetchError::Timeout`] raised by the visibility sweep.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchError {
    /// The fetch exceeded its deadline.
    #[error("fetch timed out")]
    Timeout,

    /// HTTP response with a non-success status.
    #[error("HTTP status {status}")]
    Http {
        /// The response status code.
        status: u16,
    },

    /// Network-level failure (DNS, connect, TLS, ...).
    #[error("network error: {message}")]
    Network {
        /// Detailed error message.
        message: String,
    },

    /// Anything else the fetcher surfaced; transient by default.
    #[error("{message}")]
    Other {
        /// Detailed error message.
        message: String,
    },
}
