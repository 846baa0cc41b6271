#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

mod classify;
mod error;
mod pipeline;
mod rules;

// Re-export the parsed-URL type so downstream crates do not need their
// own `url` dependency for signatures.
pub use url::Url;

pub use classify::{HostClass, classify};
pub use error::NormalizeError;
pub use pipeline::{NormalizationPipeline, normalize_parsed, normalize_url};
pub use rules::Rule;
