//! Frontier configuration.
//!
//! Injected at construction; the core never reads the environment or
//! configuration files.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::{PRIORITY_BANDS, Priority};

/// Configuration for the frontier.
///
/// Band capacities must each be a power of two so the ring mask replaces
/// a modulo; [`FrontierConfig::validate`] enforces this at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierConfig {
    /// Ring capacity per band, most urgent first.
    pub band_capacities: [usize; PRIORITY_BANDS],
    /// How long a pulled job stays invisible before the sweep reclaims it.
    pub visibility_timeout: Duration,
    /// Backoff base; retry n waits around `base * 2^n`.
    pub base_backoff: Duration,
    /// Transient failures allowed before a job is dead-lettered.
    pub max_retries: u32,
    /// Bounded size of the dead-letter log; oldest entries drop first.
    pub dead_letter_capacity: usize,
    /// Cadence of the delayed-release and visibility-sweep timer.
    pub delayed_tick: Duration,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            // P0 stays tight so urgent work drains first; P3 absorbs
            // bulk recrawl.
            band_capacities: [256, 1024, 4096, 8192],
            visibility_timeout: Duration::from_secs(30),
            base_backoff: Duration::from_secs(5),
            max_retries: 5,
            dead_letter_capacity: 1024,
            delayed_tick: Duration::from_secs(1),
        }
    }
}

impl FrontierConfig {
    /// Check every value the frontier cannot work without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for band in Priority::ALL {
            let capacity = self.band_capacities[band.index()];
            if capacity == 0 || !capacity.is_power_of_two() {
                return Err(ConfigError::CapacityNotPowerOfTwo { band, capacity });
            }
        }
        if self.visibility_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "visibility_timeout",
            });
        }
        if self.delayed_tick.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "delayed_tick",
            });
        }
        if self.dead_letter_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "dead_letter_capacity",
            });
        }
        Ok(())
    }
}

/// Error returned for configuration the frontier cannot use.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A band capacity is not a non-zero power of two.
    #[error("band {band} capacity {capacity} is not a non-zero power of two")]
    CapacityNotPowerOfTwo {
        /// The offending band.
        band: Priority,
        /// The configured capacity.
        capacity: usize,
    },

    /// A duration field is zero.
    #[error("{field} must be non-zero")]
    ZeroDuration {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A capacity field is zero.
    #[error("{field} must be non-zero")]
    ZeroCapacity {
        /// Name of the offending field.
        field: &'static str,
    },
}
