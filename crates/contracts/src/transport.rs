//! Transport trait - Dispatcher output interface
//!
//! Uniform write/close capability over datagram and stream connections.

use crate::{Batch, TransportError};

/// Connection to one store endpoint
///
/// Methods take `&self`: a connection is shared by concurrent writers and
/// must be internally safe for concurrent invocation.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Endpoint identity (used for logging/metrics)
    fn endpoint(&self) -> &str;

    /// Write a batch
    ///
    /// # Errors
    /// Returns a classified transport error
    async fn write(&self, batch: &Batch) -> Result<(), TransportError>;

    /// Issue a database creation command
    ///
    /// # Errors
    /// `TransportError::AlreadyExists` when the store reports the database
    /// exists, other variants for real failures
    async fn create_database(&self, database: &str) -> Result<(), TransportError>;

    /// Close the connection
    async fn close(&self) -> Result<(), TransportError>;
}
