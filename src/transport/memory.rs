//! In-process transport with a scriptable backend peer.
//!
//! Every successful [`MemoryConnector::connect`] hands a fresh
//! [`MemoryPeer`] to the paired [`MemoryBackend`], which plays the
//! generation backend: it reads request frames and pushes event frames.
//!
//! # Example
//!
//! ```ignore
//! let (connector, mut backend) = MemoryConnector::new();
//! let client = DocumentClient::builder().connector(connector).build();
//!
//! tokio::spawn(async move {
//!     let mut peer = backend.accept().await.unwrap();
//!     let request = peer.next_request().await.unwrap();
//!     peer.send_event(&Event::StreamingState(false));
//! });
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::{SinkExt, StreamExt};

use super::{Connector, Transport, TransportError};
use crate::handler::BoxFuture;
use crate::protocol::{encode_event, Event, RequestFrame};

type InboundItem = std::result::Result<Bytes, TransportError>;

#[derive(Default)]
struct Behavior {
    connect_delay: Option<Duration>,
    failure: Option<String>,
}

struct Shared {
    peers: UnboundedSender<MemoryPeer>,
    attempts: AtomicUsize,
    behavior: Mutex<Behavior>,
}

/// Client side: a [`Connector`] producing in-memory transports.
#[derive(Clone)]
pub struct MemoryConnector {
    shared: Arc<Shared>,
}

/// Backend side: receives one [`MemoryPeer`] per opened transport.
pub struct MemoryBackend {
    peers: UnboundedReceiver<MemoryPeer>,
}

impl MemoryConnector {
    /// Create a connector and its backend.
    pub fn new() -> (Self, MemoryBackend) {
        let (tx, rx) = unbounded();
        let connector = Self {
            shared: Arc::new(Shared {
                peers: tx,
                attempts: AtomicUsize::new(0),
                behavior: Mutex::new(Behavior::default()),
            }),
        };
        (connector, MemoryBackend { peers: rx })
    }

    /// Number of `connect` calls made so far.
    pub fn attempts(&self) -> usize {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    /// Delay every subsequent open by `delay` (`None` to open immediately).
    pub fn set_connect_delay(&self, delay: Option<Duration>) {
        self.behavior().connect_delay = delay;
    }

    /// Fail every subsequent open with `message` (`None` to succeed).
    pub fn set_failure(&self, message: Option<&str>) {
        self.behavior().failure = message.map(str::to_string);
    }

    fn behavior(&self) -> std::sync::MutexGuard<'_, Behavior> {
        self.shared
            .behavior
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Connector for MemoryConnector {
    fn connect(&self) -> BoxFuture<'static, std::result::Result<Transport, TransportError>> {
        self.shared.attempts.fetch_add(1, Ordering::SeqCst);
        let (delay, failure) = {
            let behavior = self.behavior();
            (behavior.connect_delay, behavior.failure.clone())
        };
        let shared = self.shared.clone();

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(message) = failure {
                return Err(TransportError::new(message));
            }

            let (request_tx, request_rx) = unbounded::<String>();
            let (event_tx, event_rx) = unbounded::<InboundItem>();

            let peer = MemoryPeer {
                requests: request_rx,
                events: event_tx,
            };
            shared
                .peers
                .unbounded_send(peer)
                .map_err(|_| TransportError::new("memory backend dropped"))?;

            let outbound = request_tx.sink_map_err(|e| TransportError::new(e.to_string()));
            Ok(Transport {
                outbound: Box::pin(outbound),
                inbound: Box::pin(event_rx),
            })
        })
    }
}

impl MemoryBackend {
    /// Wait for the next opened transport.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.peers.next().await
    }
}

/// The backend end of one in-memory transport.
///
/// Dropping the peer (or calling [`close`](Self::close)) closes the
/// connection from the backend side.
pub struct MemoryPeer {
    requests: UnboundedReceiver<String>,
    events: UnboundedSender<InboundItem>,
}

impl MemoryPeer {
    /// Next raw frame sent by the client.
    pub async fn next_frame(&mut self) -> Option<String> {
        self.requests.next().await
    }

    /// Next frame sent by the client, parsed as a request.
    pub async fn next_request(&mut self) -> Option<RequestFrame> {
        let frame = self.next_frame().await?;
        serde_json::from_str(&frame).ok()
    }

    /// Push a raw frame. Returns false if the client side is gone.
    pub fn send_raw(&self, frame: impl Into<Bytes>) -> bool {
        self.events.unbounded_send(Ok(frame.into())).is_ok()
    }

    /// Push a JSON value as a frame.
    pub fn send_json(&self, value: &serde_json::Value) -> bool {
        self.send_raw(value.to_string())
    }

    /// Push one event in its wire shape.
    pub fn send_event(&self, event: &Event) -> bool {
        self.send_raw(encode_event(event))
    }

    /// Fail the socket with `message`.
    pub fn fail(&self, message: &str) -> bool {
        self.events
            .unbounded_send(Err(TransportError::new(message)))
            .is_ok()
    }

    /// Close the connection from the backend side.
    pub fn close(self) {}
}
