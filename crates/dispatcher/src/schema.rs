//! Schema Guard - idempotent database creation

use contracts::{Transport, TransportError};
use tracing::{info, instrument, warn};

use crate::pool::{ConnectionState, PooledConnection};

/// Ensures the target database exists on a connection
///
/// Safe to call concurrently for the same connection: a racing creator
/// makes the store answer "already exists", which counts as success.
#[derive(Debug, Clone)]
pub struct SchemaGuard {
    database: String,
}

impl SchemaGuard {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Issue the creation command
    ///
    /// # Errors
    /// Any transport error other than "already exists"
    pub async fn ensure<C: Transport + Sync>(&self, transport: &C) -> Result<(), TransportError> {
        match transport.create_database(&self.database).await {
            Ok(()) | Err(TransportError::AlreadyExists { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Reactive recovery after a write reported the database missing
    ///
    /// Drives the connection through `Recovering` to `Ready` or `Degraded`.
    #[instrument(
        name = "schema_guard_recover",
        skip(self, connection),
        fields(endpoint = %connection.endpoint(), database = %self.database)
    )]
    pub async fn recover<C: Transport + Sync>(
        &self,
        connection: &PooledConnection<C>,
    ) -> Result<(), TransportError> {
        connection.transition(ConnectionState::Recovering);
        let result = self.ensure(connection.transport()).await;
        let success = result.is_ok();

        connection.metrics().record_recovery(success);
        observability::record_schema_recovery(connection.endpoint(), success);

        match &result {
            Ok(()) => {
                connection.transition(ConnectionState::Ready);
                info!(endpoint = %connection.endpoint(), database = %self.database, "Database recreated");
            }
            Err(e) => {
                connection.transition(ConnectionState::Degraded);
                warn!(
                    endpoint = %connection.endpoint(),
                    database = %self.database,
                    error = %e,
                    "Database not found and failed to recreate"
                );
            }
        }
        result
    }
}
