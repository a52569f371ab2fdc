//! Layered error definitions
//!
//! Categorized by source: config / transport

use std::time::Duration;

use thiserror::Error;

/// Unified error type for configuration and IO
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error returned by a single transport connection.
///
/// The transport classifies the failure itself so callers never have to
/// inspect error text.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Target database does not exist on the endpoint
    #[error("database '{database}' not found on {endpoint}")]
    SchemaMissing { endpoint: String, database: String },

    /// Database creation raced with another creator
    #[error("database '{database}' already exists on {endpoint}")]
    AlreadyExists { endpoint: String, database: String },

    /// Request did not complete within the configured timeout
    #[error("request to {endpoint} timed out after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },

    /// Endpoint answered with a non-success status
    #[error("{endpoint} rejected request with status {status}: {message}")]
    Rejected {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// Could not reach the endpoint
    #[error("connection to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    /// Operation not available over this transport
    #[error("{endpoint} does not support {operation}")]
    Unsupported {
        endpoint: String,
        operation: &'static str,
    },

    /// Connection was closed by shutdown
    #[error("connection to {endpoint} is closed")]
    Closed { endpoint: String },

    /// Socket level IO error
    #[error("io error on {endpoint}: {source}")]
    Io {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure classification used by the failover path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Target database missing, recoverable by schema creation
    SchemaMissing,
    /// Network level failure (timeout, refused, closed, io)
    Transport,
    /// Endpoint refused the payload or request
    Rejected,
}

impl FailureClass {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaMissing => "schema_missing",
            Self::Transport => "transport",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransportError {
    /// Classify this failure
    pub fn class(&self) -> FailureClass {
        match self {
            Self::SchemaMissing { .. } => FailureClass::SchemaMissing,
            Self::Rejected { .. } | Self::Unsupported { .. } => FailureClass::Rejected,
            Self::AlreadyExists { .. }
            | Self::Timeout { .. }
            | Self::Connection { .. }
            | Self::Closed { .. }
            | Self::Io { .. } => FailureClass::Transport,
        }
    }

    /// Endpoint the failure belongs to
    pub fn endpoint(&self) -> &str {
        match self {
            Self::SchemaMissing { endpoint, .. }
            | Self::AlreadyExists { endpoint, .. }
            | Self::Timeout { endpoint, .. }
            | Self::Rejected { endpoint, .. }
            | Self::Connection { endpoint, .. }
            | Self::Unsupported { endpoint, .. }
            | Self::Closed { endpoint }
            | Self::Io { endpoint, .. } => endpoint,
        }
    }

    /// Create an io error bound to an endpoint
    pub fn io(endpoint: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Create a connection error
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}
