//! Transport module - the bidirectional byte-stream under a session.
//!
//! A [`Connector`] opens one [`Transport`]: a sink of outbound text frames
//! and a stream of inbound payloads. The stream ending means the peer
//! closed; an `Err` item means the socket failed.
//!
//! - [`WsConnector`] - WebSocket via `tokio-tungstenite`
//! - [`MemoryConnector`] - in-process transport with a scriptable backend peer

mod memory;
mod ws;

use std::pin::Pin;

use bytes::Bytes;
use futures::{Sink, Stream};
use thiserror::Error;

use crate::handler::BoxFuture;

pub use memory::{MemoryBackend, MemoryConnector, MemoryPeer};
pub use ws::WsConnector;

/// Transport-level failure (open, read or write).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self(err.to_string())
    }
}

/// Outbound half: one item per text frame.
pub type OutboundSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;

/// Inbound half: frame payloads, in arrival order.
pub type InboundStream =
    Pin<Box<dyn Stream<Item = std::result::Result<Bytes, TransportError>> + Send>>;

/// An open connection, split into halves.
pub struct Transport {
    pub outbound: OutboundSink,
    pub inbound: InboundStream,
}

/// Opens transports to the backend.
///
/// The returned future is dropped if the connect timeout elapses, which must
/// abort the partial connection.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self) -> BoxFuture<'static, std::result::Result<Transport, TransportError>>;
}
