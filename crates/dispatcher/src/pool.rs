//! ConnectionPool - immutable set of connections to one destination
//!
//! Membership never changes after construction. Rebuilds produce a new pool
//! that the output swaps in; connection state lives in each member.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use contracts::{Transport, TransportError};
use tracing::debug;

use crate::metrics::{ConnectionMetrics, MetricsSnapshot};

/// Lifecycle of a pooled connection
///
/// ```text
/// Unconnected -> Ready <-> Recovering -> Degraded
///                  |                        |
///                  +------> Closed <--------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Unconnected = 0,
    Ready = 1,
    Recovering = 2,
    /// Schema recovery failed; still attempted on later calls
    Degraded = 3,
    Closed = 4,
}

impl ConnectionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Unconnected,
            1 => Self::Ready,
            2 => Self::Recovering,
            3 => Self::Degraded,
            _ => Self::Closed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unconnected => "unconnected",
            Self::Ready => "ready",
            Self::Recovering => "recovering",
            Self::Degraded => "degraded",
            Self::Closed => "closed",
        }
    }
}

/// A connection plus its state and counters
pub struct PooledConnection<C> {
    transport: C,
    state: AtomicU8,
    metrics: ConnectionMetrics,
}

impl<C: Transport> PooledConnection<C> {
    /// Wrap a freshly opened transport (state `Unconnected`)
    pub fn new(transport: C) -> Self {
        Self {
            transport,
            state: AtomicU8::new(ConnectionState::Unconnected as u8),
            metrics: ConnectionMetrics::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    pub fn transport(&self) -> &C {
        &self.transport
    }

    pub fn metrics(&self) -> &ConnectionMetrics {
        &self.metrics
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move to `next` unless the connection is already closed
    ///
    /// Returns false when the transition was refused.
    pub fn transition(&self, next: ConnectionState) -> bool {
        let result = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != ConnectionState::Closed as u8).then_some(next as u8)
            });
        if let Ok(previous) = result {
            let previous = ConnectionState::from_u8(previous);
            if previous != next {
                debug!(
                    endpoint = %self.endpoint(),
                    from = previous.as_str(),
                    to = next.as_str(),
                    "Connection state changed"
                );
            }
        }
        result.is_ok()
    }

    /// Close the transport; the state becomes `Closed` whatever the outcome
    pub async fn close(&self) -> Result<(), TransportError> {
        let result = self.transport.close().await;
        self.state
            .store(ConnectionState::Closed as u8, Ordering::Release);
        result
    }

    /// Point-in-time view for reporting
    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            endpoint: self.endpoint().to_string(),
            state: self.state(),
            counters: self.metrics.snapshot(),
        }
    }
}

/// Reporting view of one pooled connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    pub endpoint: String,
    pub state: ConnectionState,
    pub counters: MetricsSnapshot,
}

/// Ordered, immutable pool of connections
pub struct ConnectionPool<C> {
    members: Vec<Arc<PooledConnection<C>>>,
}

impl<C: Transport> ConnectionPool<C> {
    /// Pool with no members
    pub fn empty() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Build a pool from already prepared members
    pub fn from_members(members: Vec<PooledConnection<C>>) -> Self {
        Self {
            members: members.into_iter().map(Arc::new).collect(),
        }
    }

    /// Build a pool of ready connections
    pub fn ready(transports: Vec<C>) -> Self {
        let members = transports
            .into_iter()
            .map(|transport| {
                let member = PooledConnection::new(transport);
                member.transition(ConnectionState::Ready);
                member
            })
            .collect();
        Self::from_members(members)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<PooledConnection<C>>> {
        self.members.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PooledConnection<C>>> {
        self.members.iter()
    }

    /// Endpoints in construction order
    pub fn endpoints(&self) -> Vec<String> {
        self.members
            .iter()
            .map(|m| m.endpoint().to_string())
            .collect()
    }
}
