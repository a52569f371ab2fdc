//! Output error types

use contracts::TransportError;
use thiserror::Error;

use crate::encoder::EncodingError;

/// Errors surfaced to the caller of the output
///
/// Per-connection failures never appear here directly: they are logged and
/// the next candidate is tried. Only exhaustion propagates.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Endpoint URL cannot be used
    #[error("invalid endpoint '{url}': {message}")]
    Config { url: String, message: String },

    /// Connection could not be opened at pool build time
    #[error("failed to open connection to '{endpoint}': {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: TransportError,
    },

    /// A record failed validation; nothing was sent
    #[error("record {index} ('{name}') cannot be encoded: {source}")]
    Encoding {
        index: usize,
        name: String,
        #[source]
        source: EncodingError,
    },

    /// Every connection in the pool failed
    #[error("could not write to any endpoint in the pool ({attempted} of {pool_size} attempted)")]
    PoolExhausted { attempted: usize, pool_size: usize },

    /// Closing one or more connections failed
    #[error("failed to close {} connection(s): {}", .failures.len(), join_errors(.failures))]
    Close { failures: Vec<TransportError> },
}

impl OutputError {
    /// Create a configuration error
    pub fn config(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            url: url.into(),
            message: message.into(),
        }
    }
}

fn join_errors(failures: &[TransportError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
