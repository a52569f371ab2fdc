//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Input stream could not be opened or read
    #[error("Failed to read input {input}: {source}")]
    Input {
        input: String,
        #[source]
        source: std::io::Error,
    },

    /// Some batches could not be written
    #[error("{failed} of {total} batch(es) failed to write")]
    WriteFailed { failed: u64, total: u64 },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn input(input: impl Into<String>, source: std::io::Error) -> Self {
        Self::Input {
            input: input.into(),
            source,
        }
    }
}
