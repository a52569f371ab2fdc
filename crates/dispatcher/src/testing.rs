//! Test doubles for the write path
//!
//! `MockTransport` behaves like a store endpoint with scripted write
//! outcomes and a database that can be missing until created.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use contracts::{Batch, Transport, TransportError};

use crate::error::OutputError;
use crate::output::PoolFactory;
use crate::pool::ConnectionPool;

/// Scripted result of one write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOutcome {
    Ok,
    SchemaMissing,
    Timeout,
    Rejected,
}

/// Shared view of what happened to a mock transport
#[derive(Debug, Default)]
pub struct MockProbe {
    writes: AtomicUsize,
    points: AtomicUsize,
    creates: AtomicUsize,
    closes: AtomicUsize,
    database_exists: AtomicBool,
}

impl MockProbe {
    /// Number of write calls
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Points accepted by successful writes
    pub fn points(&self) -> usize {
        self.points.load(Ordering::SeqCst)
    }

    /// Number of database creation calls
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of close calls
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn database_exists(&self) -> bool {
        self.database_exists.load(Ordering::SeqCst)
    }
}

/// In-memory transport with scripted behavior
pub struct MockTransport {
    endpoint: String,
    script: Mutex<VecDeque<MockOutcome>>,
    fallback: MockOutcome,
    require_database: bool,
    fail_create: bool,
    fail_close: bool,
    delay: Option<Duration>,
    probe: Arc<MockProbe>,
}

impl MockTransport {
    fn with_fallback(endpoint: &str, fallback: MockOutcome) -> Self {
        let probe = MockProbe::default();
        probe.database_exists.store(true, Ordering::SeqCst);
        Self {
            endpoint: endpoint.to_string(),
            script: Mutex::new(VecDeque::new()),
            fallback,
            require_database: false,
            fail_create: false,
            fail_close: false,
            delay: None,
            probe: Arc::new(probe),
        }
    }

    /// Every write succeeds
    pub fn healthy(endpoint: &str) -> Self {
        Self::with_fallback(endpoint, MockOutcome::Ok)
    }

    /// Every write times out
    pub fn timing_out(endpoint: &str) -> Self {
        Self::with_fallback(endpoint, MockOutcome::Timeout)
    }

    /// Every write is rejected by the endpoint
    pub fn rejecting(endpoint: &str) -> Self {
        Self::with_fallback(endpoint, MockOutcome::Rejected)
    }

    /// Writes report a missing database until it is created
    pub fn missing_database(endpoint: &str) -> Self {
        let mock = Self::with_fallback(endpoint, MockOutcome::Ok);
        mock.probe.database_exists.store(false, Ordering::SeqCst);
        Self {
            require_database: true,
            ..mock
        }
    }

    /// Play these outcomes first, then fall back to the default behavior
    pub fn with_script(self, outcomes: impl IntoIterator<Item = MockOutcome>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(outcomes);
        self
    }

    /// Database creation fails with a connection error
    pub fn with_create_failure(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Close fails with a connection error
    pub fn with_close_failure(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Sleep before answering each write
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn probe(&self) -> Arc<MockProbe> {
        Arc::clone(&self.probe)
    }

    fn next_outcome(&self) -> MockOutcome {
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match scripted {
            Some(outcome) => outcome,
            None if self.require_database && !self.probe.database_exists() => {
                MockOutcome::SchemaMissing
            }
            None => self.fallback,
        }
    }
}

impl Transport for MockTransport {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn write(&self, batch: &Batch) -> Result<(), TransportError> {
        self.probe.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_outcome() {
            MockOutcome::Ok => {
                self.probe.points.fetch_add(batch.len(), Ordering::SeqCst);
                Ok(())
            }
            MockOutcome::SchemaMissing => Err(TransportError::SchemaMissing {
                endpoint: self.endpoint.clone(),
                database: batch.settings.database.clone(),
            }),
            MockOutcome::Timeout => Err(TransportError::Timeout {
                endpoint: self.endpoint.clone(),
                timeout: Duration::from_secs(5),
            }),
            MockOutcome::Rejected => Err(TransportError::Rejected {
                endpoint: self.endpoint.clone(),
                status: 400,
                message: "unable to parse points".to_string(),
            }),
        }
    }

    async fn create_database(&self, database: &str) -> Result<(), TransportError> {
        self.probe.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            return Err(TransportError::connection(&self.endpoint, "connection refused"));
        }
        if self.probe.database_exists.swap(true, Ordering::SeqCst) {
            return Err(TransportError::AlreadyExists {
                endpoint: self.endpoint.clone(),
                database: database.to_string(),
            });
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(TransportError::connection(&self.endpoint, "close failed"));
        }
        Ok(())
    }
}

/// Pool factory handing out prepared pools, one per build call
///
/// Once the prepared pools run out every build yields an empty pool.
pub struct MockFactory {
    pools: Mutex<VecDeque<Result<Vec<MockTransport>, OutputError>>>,
    builds: AtomicUsize,
}

impl MockFactory {
    pub fn new(pools: impl IntoIterator<Item = Result<Vec<MockTransport>, OutputError>>) -> Self {
        Self {
            pools: Mutex::new(pools.into_iter().collect()),
            builds: AtomicUsize::new(0),
        }
    }

    /// Number of build calls
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl PoolFactory for MockFactory {
    type Connection = MockTransport;

    async fn build(&self) -> Result<ConnectionPool<MockTransport>, OutputError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let next = self
            .pools
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(Ok(transports)) => Ok(ConnectionPool::ready(transports)),
            Some(Err(e)) => Err(e),
            None => Ok(ConnectionPool::empty()),
        }
    }
}
