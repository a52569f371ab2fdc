//! UdpSink - datagram fire-and-forget writes

use contracts::{Batch, Transport, TransportError};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::endpoint::EndpointSpec;
use crate::line_protocol::render_point;

/// Sink that sends line protocol over UDP
///
/// Points are packed into datagrams no larger than the payload bound; a
/// single line larger than the bound is sent on its own.
pub struct UdpSink {
    endpoint: String,
    payload_size: usize,
    socket: RwLock<Option<UdpSocket>>,
}

impl UdpSink {
    /// Bind an ephemeral local socket and connect it to the endpoint
    #[instrument(name = "udp_sink_connect", skip(spec), fields(endpoint = %spec.endpoint))]
    pub async fn connect(spec: &EndpointSpec) -> Result<Self, TransportError> {
        let endpoint = spec.endpoint.clone();
        let addr = spec
            .socket_addr()
            .ok_or_else(|| TransportError::connection(&endpoint, "missing host or port"))?;

        let target = tokio::net::lookup_host(&addr)
            .await
            .map_err(|e| TransportError::io(&endpoint, e))?
            .next()
            .ok_or_else(|| TransportError::connection(&endpoint, "host resolved to no address"))?;

        let local: SocketAddr = if target.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| TransportError::io(&endpoint, e))?;
        socket
            .connect(target)
            .await
            .map_err(|e| TransportError::io(&endpoint, e))?;

        let payload_size = spec
            .payload_size
            .unwrap_or(contracts::DEFAULT_UDP_PAYLOAD);
        debug!(endpoint = %endpoint, target = %target, payload_size, "UdpSink connected");

        Ok(Self {
            endpoint,
            payload_size,
            socket: RwLock::new(Some(socket)),
        })
    }

    /// Payload bound in bytes
    pub fn payload_size(&self) -> usize {
        self.payload_size
    }
}

/// Pack newline-terminated lines into datagrams of at most `limit` bytes
pub fn pack_datagrams<I>(lines: I, limit: usize) -> Vec<Vec<u8>>
where
    I: IntoIterator<Item = String>,
{
    let mut packets = Vec::new();
    let mut current: Vec<u8> = Vec::with_capacity(limit);

    for line in lines {
        let needed = line.len() + 1;
        if !current.is_empty() && current.len() + needed > limit {
            packets.push(std::mem::take(&mut current));
        }
        current.extend_from_slice(line.as_bytes());
        current.push(b'\n');
    }

    if !current.is_empty() {
        packets.push(current);
    }
    packets
}

impl Transport for UdpSink {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(
        name = "udp_sink_write",
        skip(self, batch),
        fields(endpoint = %self.endpoint, points = batch.len())
    )]
    async fn write(&self, batch: &Batch) -> Result<(), TransportError> {
        let guard = self.socket.read().await;
        let socket = guard.as_ref().ok_or_else(|| TransportError::Closed {
            endpoint: self.endpoint.clone(),
        })?;

        let packets = pack_datagrams(batch.points.iter().map(render_point), self.payload_size);
        for packet in &packets {
            socket
                .send(packet)
                .await
                .map_err(|e| TransportError::io(&self.endpoint, e))?;
        }

        debug!(endpoint = %self.endpoint, packets = packets.len(), "Sent");
        Ok(())
    }

    async fn create_database(&self, _database: &str) -> Result<(), TransportError> {
        Err(TransportError::Unsupported {
            endpoint: self.endpoint.clone(),
            operation: "database creation",
        })
    }

    #[instrument(name = "udp_sink_close", skip(self), fields(endpoint = %self.endpoint))]
    async fn close(&self) -> Result<(), TransportError> {
        self.socket.write().await.take();
        debug!(endpoint = %self.endpoint, "UdpSink closed");
        Ok(())
    }
}
