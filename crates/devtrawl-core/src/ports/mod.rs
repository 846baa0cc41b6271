//! Ports the frontier consumes.
//!
//! Every port is synchronous and must not block: implementations that
//! need I/O should hand work to their own channel or task.

mod clock;
mod dead_letter;
mod failure;

pub use clock::{ClockPort, ManualClock, SystemClock};
pub use dead_letter::{DeadLetterSinkPort, NoopDeadLetterSink};
pub use failure::{FailureClassifierPort, HttpStatusClassifier};
