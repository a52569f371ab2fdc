//! Transport implementations
//!
//! Contains UdpSink (datagram) and HttpSink (stream), unified by `Connection`.

mod http;
mod udp;

pub use self::http::HttpSink;
pub use self::udp::{pack_datagrams, UdpSink};

use contracts::{Batch, Transport, TransportError};

use crate::endpoint::{EndpointSpec, TransportKind};

/// A live connection of either wire style
pub enum Connection {
    Datagram(UdpSink),
    Stream(HttpSink),
}

impl Connection {
    /// Open the transport described by `spec`
    pub async fn open(spec: &EndpointSpec) -> Result<Self, TransportError> {
        match spec.kind {
            TransportKind::Datagram => UdpSink::connect(spec).await.map(Self::Datagram),
            TransportKind::Stream => HttpSink::new(spec).map(Self::Stream),
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Datagram(_) => TransportKind::Datagram,
            Self::Stream(_) => TransportKind::Stream,
        }
    }
}

impl Transport for Connection {
    fn endpoint(&self) -> &str {
        match self {
            Self::Datagram(sink) => sink.endpoint(),
            Self::Stream(sink) => sink.endpoint(),
        }
    }

    async fn write(&self, batch: &Batch) -> Result<(), TransportError> {
        match self {
            Self::Datagram(sink) => sink.write(batch).await,
            Self::Stream(sink) => sink.write(batch).await,
        }
    }

    async fn create_database(&self, database: &str) -> Result<(), TransportError> {
        match self {
            Self::Datagram(sink) => sink.create_database(database).await,
            Self::Stream(sink) => sink.create_database(database).await,
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        match self {
            Self::Datagram(sink) => sink.close().await,
            Self::Stream(sink) => sink.close().await,
        }
    }
}
