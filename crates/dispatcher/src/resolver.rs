//! Endpoint Resolver - configured URLs to a ready connection pool

use contracts::{BatchSettings, OutputConfig, Transport};
use tracing::{info, instrument, warn};

use crate::endpoint::{EndpointSpec, TransportKind};
use crate::error::OutputError;
use crate::output::PoolFactory;
use crate::pool::{ConnectionPool, ConnectionState, PooledConnection};
use crate::schema::SchemaGuard;
use crate::sinks::Connection;

/// Resolves the output configuration and opens connections on demand
///
/// Endpoint URLs are resolved once at construction; every `build` opens a
/// fresh set of connections from those descriptors.
#[derive(Debug, Clone)]
pub struct EndpointResolver {
    config: OutputConfig,
    endpoints: Vec<EndpointSpec>,
    guard: SchemaGuard,
}

impl EndpointResolver {
    /// # Errors
    /// `OutputError::Config` for the first URL that cannot be resolved
    pub fn new(config: OutputConfig) -> Result<Self, OutputError> {
        let endpoints = EndpointSpec::resolve_all(&config)?;
        let guard = SchemaGuard::new(config.database.clone());
        Ok(Self {
            config,
            endpoints,
            guard,
        })
    }

    /// Resolved endpoints in configuration order
    pub fn endpoints(&self) -> &[EndpointSpec] {
        &self.endpoints
    }

    /// Write settings stamped on every batch
    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            database: self.config.database.clone(),
            retention_policy: self.config.retention_policy.clone(),
            write_consistency: self.config.write_consistency.clone(),
        }
    }

    /// Open one connection and run the schema check for stream endpoints
    ///
    /// Returns `Ok(None)` when the connection was excluded.
    async fn open(
        &self,
        spec: &EndpointSpec,
    ) -> Result<Option<PooledConnection<Connection>>, OutputError> {
        let connection = Connection::open(spec)
            .await
            .map_err(|source| OutputError::Connect {
                endpoint: spec.endpoint.clone(),
                source,
            })?;
        let member = PooledConnection::new(connection);

        if spec.kind == TransportKind::Stream {
            if let Err(e) = self.guard.ensure(member.transport()).await {
                warn!(
                    endpoint = %spec.endpoint,
                    database = %self.guard.database(),
                    class = %e.class(),
                    error = %e,
                    "Database creation failed, excluding endpoint from pool"
                );
                release_excluded(&member).await;
                return Ok(None);
            }
        }

        member.transition(ConnectionState::Ready);
        Ok(Some(member))
    }
}

/// Close a connection that will not join the pool
async fn release_excluded<C: Transport + Sync>(member: &PooledConnection<C>) {
    if let Err(e) = member.close().await {
        warn!(endpoint = %member.endpoint(), error = %e, "Failed to close excluded connection");
    }
}

impl PoolFactory for EndpointResolver {
    type Connection = Connection;

    #[instrument(name = "endpoint_resolver_build", skip(self), fields(endpoints = self.endpoints.len()))]
    async fn build(&self) -> Result<ConnectionPool<Connection>, OutputError> {
        let mut members = Vec::with_capacity(self.endpoints.len());
        for spec in &self.endpoints {
            if let Some(member) = self.open(spec).await? {
                members.push(member);
            }
        }

        let pool = ConnectionPool::from_members(members);
        info!(
            pool_size = pool.len(),
            configured = self.endpoints.len(),
            "Connection pool built"
        );
        Ok(pool)
    }
}
