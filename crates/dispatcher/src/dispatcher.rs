//! Failover Dispatcher - write-until-first-success over a shuffled pool
//!
//! Each call walks a fresh uniform permutation of the pool. The first
//! successful write ends the call; remaining candidates are never tried, so a
//! batch reaches at most one connection.

use contracts::{Batch, FailureClass, Transport};
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

use crate::error::OutputError;
use crate::pool::{ConnectionPool, ConnectionState};
use crate::schema::SchemaGuard;

/// Result of a successful dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Endpoint that accepted the batch
    pub endpoint: String,
    /// Connections tried, including the successful one
    pub attempts: usize,
}

/// Randomized failover across the connections of one pool
#[derive(Debug, Clone)]
pub struct FailoverDispatcher {
    guard: SchemaGuard,
}

impl FailoverDispatcher {
    pub fn new(guard: SchemaGuard) -> Self {
        Self { guard }
    }

    /// Write `batch` to the first connection that accepts it
    ///
    /// Per-connection failures are logged and swallowed. A missing database
    /// triggers schema recovery on that connection before moving on; the same
    /// connection is not retried within the call.
    ///
    /// # Errors
    /// `OutputError::PoolExhausted` when no connection accepted the batch
    #[instrument(
        name = "failover_dispatch",
        skip(self, pool, batch),
        fields(pool_size = pool.len(), points = batch.len())
    )]
    pub async fn dispatch<C: Transport + Sync>(
        &self,
        pool: &ConnectionPool<C>,
        batch: &Batch,
    ) -> Result<DispatchReport, OutputError> {
        let order = shuffled_indices(pool.len());
        let mut attempts = 0;

        for index in order {
            let Some(connection) = pool.get(index) else {
                continue;
            };
            attempts += 1;

            match connection.transport().write(batch).await {
                Ok(()) => {
                    connection.metrics().inc_write_count();
                    if connection.state() == ConnectionState::Degraded {
                        connection.transition(ConnectionState::Ready);
                    }
                    observability::record_write_attempt(connection.endpoint(), None);
                    debug!(endpoint = %connection.endpoint(), attempts, "Batch written");
                    return Ok(DispatchReport {
                        endpoint: connection.endpoint().to_string(),
                        attempts,
                    });
                }
                Err(e) => {
                    connection.metrics().inc_failure_count();
                    let class = e.class();
                    observability::emit_write_failure(connection.endpoint(), class, &e);

                    if class == FailureClass::SchemaMissing {
                        // outcome already logged by the guard
                        let _ = self.guard.recover(connection).await;
                    }
                }
            }
        }

        Err(OutputError::PoolExhausted {
            attempted: attempts,
            pool_size: pool.len(),
        })
    }
}

/// Uniform random permutation of `0..len`, fresh on every call
pub fn shuffled_indices(len: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(&mut rand::rng());
    order
}
