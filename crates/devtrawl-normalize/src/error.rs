//! Normalization errors.

use thiserror::Error;

/// Error produced when a raw URL cannot enter the pipeline.
///
/// Parsing is the only thing that can fail; once a URL parses, every
/// rule succeeds.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// The input failed to parse as an absolute URL.
    #[error("bad url: {message}")]
    BadUrl {
        /// The parser's explanation.
        message: String,
    },
}

impl From<url::ParseError> for NormalizeError {
    fn from(err: url::ParseError) -> Self {
        Self::BadUrl {
            message: err.to_string(),
        }
    }
}
