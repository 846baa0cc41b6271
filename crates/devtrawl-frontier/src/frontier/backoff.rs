//! Retry backoff computation.

use std::time::Duration;

use rand::Rng;

/// Lower edge of the jitter band.
const JITTER_LOW: f64 = 0.75;
/// Width of the jitter band; samples land in `[0.75, 1.25)`.
const JITTER_SPAN: f64 = 0.5;

/// Delay before retry number `retry_count` (1-based): `base * 2^n`
/// scaled by a uniform jitter factor.
pub fn backoff_delay<R: Rng + ?Sized>(base: Duration, retry_count: u32, rng: &mut R) -> Duration {
    let exponential = base.saturating_mul(2u32.saturating_pow(retry_count));
    let factor = JITTER_LOW + rng.r#gen::<f64>() * JITTER_SPAN;
    exponential.mul_f64(factor)
}
