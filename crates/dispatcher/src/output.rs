//! MetricOutput - lifecycle facade over the connection pool
//!
//! `connect()` builds the pool, `write()` encodes and fails over across it,
//! `close()` tears it down; writes after `close()` fail without reopening
//! anything until the next `connect()`. The pool sits behind an `RwLock<Arc<..>>`:
//! writers clone the `Arc` and dispatch without holding the lock; rebuild and
//! close swap the whole pool under the write lock.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use contracts::{BatchSettings, MetricRecord, OutputConfig, Transport};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::dispatcher::FailoverDispatcher;
use crate::encoder::BatchEncoder;
use crate::error::OutputError;
use crate::pool::{ConnectionPool, ConnectionStats};
use crate::resolver::EndpointResolver;
use crate::schema::SchemaGuard;

/// Builds a fresh connection pool
///
/// Implemented by [`EndpointResolver`] for real endpoints; tests plug in
/// prepared pools.
pub trait PoolFactory: Send + Sync {
    type Connection: Transport + Sync + 'static;

    /// Open every configured connection
    ///
    /// # Errors
    /// Fatal construction problems only. Connections that fail their schema
    /// check are excluded, so an empty pool is a valid result.
    fn build(
        &self,
    ) -> impl Future<Output = Result<ConnectionPool<Self::Connection>, OutputError>> + Send;
}

/// Outcome of one successful write call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    /// Endpoint that accepted the batch (`None` when there was nothing to send)
    pub endpoint: Option<String>,
    /// Connections tried
    pub attempts: usize,
    /// Points written
    pub points: usize,
}

/// Output adapter writing metric batches to a pool of store endpoints
pub struct MetricOutput<F: PoolFactory = EndpointResolver> {
    factory: F,
    encoder: BatchEncoder,
    dispatcher: FailoverDispatcher,
    pool: RwLock<Arc<ConnectionPool<F::Connection>>>,
    closed: AtomicBool,
}

impl MetricOutput<EndpointResolver> {
    /// Output for the endpoints in `config`
    ///
    /// # Errors
    /// `OutputError::Config` when an endpoint URL cannot be resolved
    pub fn from_config(config: OutputConfig) -> Result<Self, OutputError> {
        let resolver = EndpointResolver::new(config)?;
        let settings = resolver.batch_settings();
        Ok(Self::new(resolver, settings))
    }
}

impl<F: PoolFactory> MetricOutput<F> {
    /// Output with an empty pool; call [`connect`](Self::connect) or let the
    /// first write build it
    pub fn new(factory: F, settings: BatchSettings) -> Self {
        let guard = SchemaGuard::new(settings.database.clone());
        Self {
            factory,
            encoder: BatchEncoder::new(settings),
            dispatcher: FailoverDispatcher::new(guard),
            pool: RwLock::new(Arc::new(ConnectionPool::empty())),
            closed: AtomicBool::new(false),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Build the pool and swap it in
    ///
    /// Connections that fail their schema check are dropped, so this can
    /// succeed with an empty pool; the next write then retries the build.
    ///
    /// # Errors
    /// Fatal construction errors from the factory
    #[instrument(name = "output_connect", skip(self))]
    pub async fn connect(&self) -> Result<(), OutputError> {
        let pool = Arc::new(self.factory.build().await?);
        let size = pool.len();

        let previous = {
            let mut slot = self.pool.write().await;
            self.closed.store(false, Ordering::Release);
            std::mem::replace(&mut *slot, pool)
        };
        observability::record_pool_size(size);
        info!(pool_size = size, "Output connected");

        if let Err(e) = close_pool(&previous).await {
            warn!(error = %e, "Failed to close replaced pool");
        }
        Ok(())
    }

    /// Encode `records` and write them to exactly one connection
    ///
    /// Nothing is sent when any record is invalid. An empty slice succeeds
    /// without touching the network.
    ///
    /// # Errors
    /// - `OutputError::Encoding` for an invalid record
    /// - `OutputError::PoolExhausted` when no connection accepted the batch
    #[instrument(name = "output_write", skip(self, records), fields(records = records.len()))]
    pub async fn write(&self, records: &[MetricRecord]) -> Result<WriteReport, OutputError> {
        let batch = self.encoder.encode(records)?;
        if batch.is_empty() {
            return Ok(WriteReport {
                endpoint: None,
                attempts: 0,
                points: 0,
            });
        }
        observability::record_batch_encoded(batch.len());

        let start = Instant::now();
        let pool = self.current_pool().await;
        let result = if pool.is_empty() {
            Err(OutputError::PoolExhausted {
                attempted: 0,
                pool_size: 0,
            })
        } else {
            self.dispatcher.dispatch(&pool, &batch).await
        };
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(report) => {
                observability::record_batch_outcome(true, report.attempts, latency_ms);
                Ok(WriteReport {
                    endpoint: Some(report.endpoint),
                    attempts: report.attempts,
                    points: batch.len(),
                })
            }
            Err(e) => {
                let attempts = match &e {
                    OutputError::PoolExhausted { attempted, .. } => *attempted,
                    _ => 0,
                };
                observability::record_batch_outcome(false, attempts, latency_ms);
                warn!(error = %e, "Batch write failed");
                Err(e)
            }
        }
    }

    /// Close every connection and leave the output with an empty pool
    ///
    /// All connections are closed even when some fail. Later writes return
    /// `PoolExhausted` without rebuilding until [`connect`](Self::connect)
    /// is called again.
    ///
    /// # Errors
    /// `OutputError::Close` carrying every individual failure
    #[instrument(name = "output_close", skip(self))]
    pub async fn close(&self) -> Result<(), OutputError> {
        let previous = {
            let mut slot = self.pool.write().await;
            self.closed.store(true, Ordering::Release);
            std::mem::replace(&mut *slot, Arc::new(ConnectionPool::empty()))
        };
        observability::record_pool_size(0);
        let result = close_pool(&previous).await;
        info!(connections = previous.len(), "Output closed");
        result
    }

    /// Number of connections in the current pool
    pub async fn pool_size(&self) -> usize {
        self.pool.read().await.len()
    }

    /// State and counters for every connection in the current pool
    pub async fn connection_stats(&self) -> Vec<ConnectionStats> {
        let pool = Arc::clone(&*self.pool.read().await);
        pool.iter().map(|c| c.stats()).collect()
    }

    /// Current pool, rebuilt first when empty unless the output was closed
    ///
    /// Concurrent callers that find the pool empty queue on the write lock;
    /// the first one rebuilds and the rest see its result.
    async fn current_pool(&self) -> Arc<ConnectionPool<F::Connection>> {
        {
            let pool = self.pool.read().await;
            if !pool.is_empty() {
                return Arc::clone(&pool);
            }
        }

        let mut slot = self.pool.write().await;
        if !slot.is_empty() {
            return Arc::clone(&slot);
        }
        if self.closed.load(Ordering::Acquire) {
            debug!("Output closed, not rebuilding the pool");
            return Arc::clone(&slot);
        }

        match self.factory.build().await {
            Ok(pool) => {
                observability::record_pool_rebuild(true);
                observability::record_pool_size(pool.len());
                info!(pool_size = pool.len(), "Connection pool rebuilt");
                *slot = Arc::new(pool);
            }
            Err(e) => {
                observability::record_pool_rebuild(false);
                warn!(error = %e, "Failed to rebuild connection pool");
            }
        }
        Arc::clone(&slot)
    }
}

async fn close_pool<C: Transport + Sync>(pool: &ConnectionPool<C>) -> Result<(), OutputError> {
    let mut failures = Vec::new();
    for connection in pool.iter() {
        if let Err(e) = connection.close().await {
            warn!(endpoint = %connection.endpoint(), error = %e, "Failed to close connection");
            failures.push(e);
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(OutputError::Close { failures })
    }
}
