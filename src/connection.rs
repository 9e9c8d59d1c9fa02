//! Connection manager: transport lifecycle and the inbound read loop.
//!
//! Owns the single transport to the backend:
//! 1. `connect()` opens it with a timeout; concurrent callers share one attempt
//! 2. A reader task decodes inbound frames and dispatches them, one at a time,
//!    to the [`CallbackRegistry`]
//! 3. Peer close and transport errors mark the connection `Closed` and are
//!    announced through the [`ObserverChain`]
//! 4. `disconnect()` tears everything down and is safe to repeat
//!
//! # Architecture
//!
//! ```text
//! connect() ─► Connector ─► Transport ─┬─ outbound sink ◄── send()
//!                                      └─ inbound stream ─► read loop ─► decode ─► registry
//!                                                               │
//!                                                  close/error ─┴─► observers
//! ```

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::{FutureExt, Shared};
use futures::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::{ConnectError, DraftwireError, Result};
use crate::handler::{BoxFuture, CallbackRegistry};
use crate::observer::{ConnectionObserver, ObserverChain, ObserverGuard, ObserverId};
use crate::protocol::{decode_frame, Event};
use crate::transport::{Connector, InboundStream, OutboundSink, Transport};

/// Lifecycle state of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected, or torn down by `disconnect()` / a failed attempt.
    Disconnected,
    /// An attempt is in flight.
    Connecting,
    /// Transport open; frames flow.
    Open,
    /// Peer closed or transport failed. The next `connect()` reopens.
    Closed,
}

type PendingConnect = Shared<BoxFuture<'static, std::result::Result<(), ConnectError>>>;

struct Link {
    state: ConnectionState,
    pending: Option<PendingConnect>,
    reader: Option<JoinHandle<()>>,
    /// Bumped by every new attempt and by `disconnect()`. Stale attempts and
    /// readers compare against it and stand down.
    generation: u64,
}

struct Inner {
    connector: Arc<dyn Connector>,
    connect_timeout: Duration,
    link: Mutex<Link>,
    outbound: Mutex<Option<OutboundSink>>,
    registry: Mutex<CallbackRegistry>,
    observers: Arc<ObserverChain>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(reader) = self.link.get_mut().reader.take() {
            reader.abort();
        }
    }
}

/// Owns the transport. Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Create a manager. Nothing is opened until [`connect`](Self::connect).
    pub fn new(connector: Arc<dyn Connector>, connect_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector,
                connect_timeout,
                link: Mutex::new(Link {
                    state: ConnectionState::Disconnected,
                    pending: None,
                    reader: None,
                    generation: 0,
                }),
                outbound: Mutex::new(None),
                registry: Mutex::new(CallbackRegistry::new()),
                observers: Arc::new(ObserverChain::new()),
            }),
        }
    }

    /// Current state.
    pub async fn state(&self) -> ConnectionState {
        self.inner.link.lock().await.state
    }

    /// True if the transport is open.
    pub async fn is_open(&self) -> bool {
        self.state().await == ConnectionState::Open
    }

    /// Configured connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.inner.connect_timeout
    }

    /// Open the transport if it is not open yet.
    ///
    /// Concurrent callers await the same attempt and see the same outcome.
    pub async fn connect(&self) -> Result<()> {
        let attempt = {
            let mut link = self.inner.link.lock().await;
            if link.state == ConnectionState::Open {
                return Ok(());
            }
            match &link.pending {
                Some(pending) => {
                    tracing::debug!("Joining pending connection attempt");
                    pending.clone()
                }
                None => {
                    link.generation += 1;
                    let attempt = self.clone().open(link.generation).boxed().shared();
                    link.pending = Some(attempt.clone());
                    link.state = ConnectionState::Connecting;
                    attempt
                }
            }
        };

        attempt.await.map_err(DraftwireError::from)
    }

    /// Run one connection attempt.
    async fn open(self, generation: u64) -> std::result::Result<(), ConnectError> {
        let timeout = self.inner.connect_timeout;
        tracing::debug!("Opening connection (timeout {:?})", timeout);

        // On timeout the connect future is dropped, aborting the partial connection.
        let result = tokio::time::timeout(timeout, self.inner.connector.connect()).await;

        let mut link = self.inner.link.lock().await;
        if link.generation != generation {
            tracing::warn!("Connection attempt superseded by disconnect");
            return Err(ConnectError::Failure(
                "connection attempt cancelled by disconnect".to_string(),
            ));
        }
        link.pending = None;

        let transport = match result {
            Err(_) => {
                link.state = ConnectionState::Disconnected;
                tracing::warn!("Connection timed out after {:?}", timeout);
                return Err(ConnectError::Timeout(timeout));
            }
            Ok(Err(e)) => {
                link.state = ConnectionState::Disconnected;
                tracing::error!("Connection failed: {}", e);
                return Err(ConnectError::Failure(e.to_string()));
            }
            Ok(Ok(transport)) => transport,
        };

        let Transport { outbound, inbound } = transport;
        *self.inner.outbound.lock().await = Some(outbound);
        link.reader = Some(tokio::spawn(read_loop(
            inbound,
            Arc::downgrade(&self.inner),
            generation,
        )));
        link.state = ConnectionState::Open;
        tracing::debug!("Connection open");
        Ok(())
    }

    /// Send one text frame.
    pub async fn send(&self, frame: String) -> Result<()> {
        let mut outbound = self.inner.outbound.lock().await;
        let sink = outbound.as_mut().ok_or(DraftwireError::NotConnected)?;
        sink.send(frame)
            .await
            .map_err(|e| DraftwireError::Stream(e.to_string()))
    }

    /// Tear the connection down. Idempotent.
    ///
    /// Clears every registered callback and drops request-scoped observers
    /// after telling them, then closes the transport and stops the reader.
    /// Safe to call from inside a handler running on the reader task.
    pub async fn disconnect(&self) {
        let (previous, outbound, reader) = {
            let mut link = self.inner.link.lock().await;
            link.generation += 1;
            link.pending = None;
            let reader = link.reader.take();
            let outbound = self.inner.outbound.lock().await.take();
            let previous = std::mem::replace(&mut link.state, ConnectionState::Disconnected);
            (previous, outbound, reader)
        };

        self.inner.registry.lock().await.clear();
        self.inner.observers.notify_disconnect();
        self.inner.observers.clear_scoped();

        if let Some(mut sink) = outbound {
            if let Err(e) = sink.close().await {
                tracing::debug!("Error closing transport: {}", e);
            }
        }

        // Last: when called from a handler this cancels the caller's own task.
        if let Some(reader) = reader {
            reader.abort();
        }

        if previous != ConnectionState::Disconnected {
            tracing::debug!("Disconnected (was {:?})", previous);
        }
    }

    /// Register a long-lived observer, kept across requests and reconnects.
    pub fn observe(&self, observer: Arc<dyn ConnectionObserver>) -> ObserverId {
        self.inner.observers.push(observer)
    }

    /// Remove a long-lived observer.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.inner.observers.remove(id)
    }

    /// Register a request-scoped observer, removed when the guard drops.
    pub(crate) fn push_scoped(&self, observer: Arc<dyn ConnectionObserver>) -> ObserverGuard {
        self.inner.observers.push_scoped(observer)
    }

    /// The callback registry fed by the read loop.
    pub(crate) fn registry(&self) -> &Mutex<CallbackRegistry> {
        &self.inner.registry
    }
}

impl Inner {
    /// Route one event to its handler and wait for the handler to finish.
    async fn dispatch(&self, event: Event) {
        if let Event::Error(message) = &event {
            tracing::error!("Backend error payload: {}", message);
        }

        let kind = event.kind();
        // Clone the handler out so the registry is not locked while it runs.
        let handler = self.registry.lock().await.handler(kind);
        match handler {
            Some(handler) => handler(event).await,
            None => tracing::debug!("No handler registered for {} event", kind),
        }
    }

    async fn is_current(&self, generation: u64) -> bool {
        self.link.lock().await.generation == generation
    }

    /// Mark the connection closed if `generation` is still current.
    async fn mark_closed(&self, generation: u64) -> bool {
        let mut link = self.link.lock().await;
        if link.generation != generation {
            return false;
        }
        link.state = ConnectionState::Closed;
        link.reader = None;
        self.outbound.lock().await.take();
        true
    }

    async fn transport_closed(&self, generation: u64) {
        if self.mark_closed(generation).await {
            tracing::debug!("Connection closed by peer");
            self.observers.notify_close();
        }
    }

    async fn transport_failed(&self, generation: u64, error: &str) {
        if self.mark_closed(generation).await {
            tracing::error!("Transport error: {}", error);
            self.observers.notify_error(error);
        }
    }
}

/// Main read loop - decodes frames in arrival order and dispatches them.
///
/// Holds only a weak reference so dropping the last manager ends the loop.
async fn read_loop(mut inbound: InboundStream, inner: Weak<Inner>, generation: u64) {
    while let Some(item) = inbound.next().await {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        // A reader outliving its connection must not feed the next request.
        if !inner.is_current(generation).await {
            return;
        }

        match item {
            Ok(payload) => match decode_frame(&payload) {
                Ok(event) => inner.dispatch(event).await,
                Err(e) => tracing::warn!("Dropping inbound frame: {}", e),
            },
            Err(e) => {
                inner.transport_failed(generation, e.message()).await;
                return;
            }
        }
    }

    if let Some(inner) = inner.upgrade() {
        inner.transport_closed(generation).await;
    }
}
