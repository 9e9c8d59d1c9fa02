//! Session coordinator for one logical "generate document" exchange.
//!
//! A session installs the caller's callbacks, sends the request, then waits
//! for the first terminal condition:
//!
//! - `streaming: false` resolves [`Outcome::Completed`]
//! - a peer close resolves [`Outcome::ClosedEarly`]
//! - a transport error fails the request with [`DraftwireError::Stream`]
//! - a local `disconnect()` abandons it with [`DraftwireError::Disconnected`]
//!
//! Whichever fires first settles the request; the rest are no-ops. Every
//! per-request handler and the scoped observer are removed on the way out.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::connection::ConnectionManager;
use crate::error::{DraftwireError, Result};
use crate::handler::{BoxFuture, Callbacks, Handler};
use crate::observer::ConnectionObserver;
use crate::protocol::{Event, EventKind, GenerateRequest};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Idle,
    /// Connecting if needed, installing handlers, writing the request.
    Sending,
    /// Request written; dispatching events until a terminal condition.
    Streaming,
    Resolved,
}

/// How a successful request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The backend sent `streaming: false`.
    Completed,
    /// The connection closed before the stream ended.
    ClosedEarly,
}

/// Result of a resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: Outcome,
    /// Most recent interrupt payload, if the backend asked for more information.
    pub interrupt: Option<String>,
    /// Most recent draft checkpoint.
    pub draft: Option<String>,
    /// Number of chunks received.
    pub chunks: usize,
}

impl Resolution {
    pub fn is_completed(&self) -> bool {
        self.outcome == Outcome::Completed
    }

    /// True if the backend interrupted to ask for missing information.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_some()
    }
}

/// Terminal condition reported to the waiting session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Settlement {
    Completed,
    ClosedEarly,
    Failed(String),
    Abandoned,
}

/// Delivers the first settlement and ignores the rest.
struct SettleOnce {
    tx: Mutex<Option<oneshot::Sender<Settlement>>>,
}

impl SettleOnce {
    fn new() -> (Arc<Self>, oneshot::Receiver<Settlement>) {
        let (tx, rx) = oneshot::channel();
        let settle = Arc::new(Self {
            tx: Mutex::new(Some(tx)),
        });
        (settle, rx)
    }

    fn settle(&self, settlement: Settlement) -> bool {
        let tx = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match tx {
            Some(tx) => {
                tracing::debug!("Request settled: {:?}", settlement);
                // Receiver gone means the session was dropped; nothing to tell.
                let _ = tx.send(settlement);
                true
            }
            None => {
                tracing::debug!("Ignoring late settlement: {:?}", settlement);
                false
            }
        }
    }
}

#[derive(Default)]
struct RequestRecord {
    interrupt: Option<String>,
    draft: Option<String>,
    chunks: usize,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<RequestRecord>>);

impl Recorder {
    fn lock(&self) -> MutexGuard<'_, RequestRecord> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: &Event) {
        let mut record = self.lock();
        match event {
            Event::Chunk(_) => record.chunks += 1,
            Event::DraftContent(content) => record.draft = Some(content.clone()),
            Event::Interrupt(payload) => record.interrupt = Some(payload.clone()),
            _ => {}
        }
    }

    fn resolution(&self, outcome: Outcome) -> Resolution {
        let mut record = self.lock();
        Resolution {
            outcome,
            interrupt: record.interrupt.take(),
            draft: record.draft.take(),
            chunks: record.chunks,
        }
    }
}

/// Scoped observer mapping connection events onto settlements.
struct RequestObserver {
    settle: Arc<SettleOnce>,
}

impl ConnectionObserver for RequestObserver {
    fn on_close(&self) {
        self.settle.settle(Settlement::ClosedEarly);
    }

    fn on_error(&self, error: &str) {
        self.settle.settle(Settlement::Failed(error.to_string()));
    }

    fn on_disconnect(&self) {
        self.settle.settle(Settlement::Abandoned);
    }
}

/// One logical request against a connection.
pub(crate) struct Session<'a> {
    connection: &'a ConnectionManager,
    state: SessionState,
}

impl<'a> Session<'a> {
    pub(crate) fn new(connection: &'a ConnectionManager) -> Self {
        Self {
            connection,
            state: SessionState::Idle,
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Drive `request` to its single resolution.
    pub(crate) async fn run(
        mut self,
        request: &GenerateRequest,
        callbacks: Callbacks,
    ) -> Result<Resolution> {
        self.transition(SessionState::Sending);
        let frame = request.encode()?;

        // The transport can close between the connect check and the write.
        // That surfaces as `NotConnected` and gets one reconnect.
        let mut retried = false;
        let (rx, recorder, guard) = loop {
            if !self.connection.is_open().await {
                self.connection.connect().await?;
            }

            let (settle, rx) = SettleOnce::new();
            let recorder = Recorder::default();
            self.install(&callbacks, &settle, &recorder).await;
            let guard = self.connection.push_scoped(Arc::new(RequestObserver {
                settle: settle.clone(),
            }));

            tracing::debug!(
                "Sending request for document {} ({:?})",
                request.document_id,
                request.mode
            );
            match self.connection.send(frame.clone()).await {
                Ok(()) => break (rx, recorder, guard),
                Err(e) => {
                    self.connection.registry().lock().await.clear();
                    drop(guard);
                    if matches!(e, DraftwireError::NotConnected) && !retried {
                        tracing::debug!("Connection closed before send, reconnecting");
                        retried = true;
                        continue;
                    }
                    self.transition(SessionState::Resolved);
                    return Err(e);
                }
            }
        };
        self.transition(SessionState::Streaming);

        let settlement = rx.await.unwrap_or(Settlement::Abandoned);

        self.connection.registry().lock().await.clear();
        drop(guard);
        self.transition(SessionState::Resolved);

        match settlement {
            Settlement::Completed => Ok(recorder.resolution(Outcome::Completed)),
            Settlement::ClosedEarly => Ok(recorder.resolution(Outcome::ClosedEarly)),
            Settlement::Failed(message) => Err(DraftwireError::Stream(message)),
            Settlement::Abandoned => Err(DraftwireError::Disconnected),
        }
    }

    /// Install the caller's callbacks wrapped with recording, plus the
    /// streaming proxy that settles on `streaming: false`.
    async fn install(&self, callbacks: &Callbacks, settle: &Arc<SettleOnce>, recorder: &Recorder) {
        let mut registry = self.connection.registry().lock().await;
        registry.clear();
        registry.install(callbacks);

        for kind in [EventKind::Chunk, EventKind::DraftContent, EventKind::Interrupt] {
            let inner = registry.handler(kind);
            registry.register(kind, recording_handler(recorder.clone(), inner));
        }
        registry.register(
            EventKind::Streaming,
            streaming_proxy(callbacks.clone(), settle.clone()),
        );
    }
}

fn recording_handler(recorder: Recorder, inner: Option<Handler>) -> Handler {
    Arc::new(move |event: Event| -> BoxFuture<'static, ()> {
        recorder.record(&event);
        match &inner {
            Some(handler) => handler(event),
            None => Box::pin(std::future::ready(())),
        }
    })
}

fn streaming_proxy(callbacks: Callbacks, settle: Arc<SettleOnce>) -> Handler {
    Arc::new(move |event: Event| -> BoxFuture<'static, ()> {
        if let Event::StreamingState(streaming) = event {
            callbacks.notify_streaming(streaming);
            if !streaming {
                settle.settle(Settlement::Completed);
            }
        }
        Box::pin(std::future::ready(()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionState;
    use crate::transport::MemoryConnector;
    use std::time::Duration;

    #[tokio::test]
    async fn test_settle_once_keeps_first() {
        let (settle, rx) = SettleOnce::new();
        assert!(settle.settle(Settlement::Completed));
        assert!(!settle.settle(Settlement::ClosedEarly));
        assert!(!settle.settle(Settlement::Failed("late".into())));
        assert_eq!(rx.await.unwrap(), Settlement::Completed);
    }

    #[test]
    fn test_settle_after_receiver_dropped() {
        let (settle, rx) = SettleOnce::new();
        drop(rx);
        assert!(settle.settle(Settlement::Abandoned));
        assert!(!settle.settle(Settlement::Abandoned));
    }

    #[test]
    fn test_recorder_tracks_latest_payloads() {
        let recorder = Recorder::default();
        recorder.record(&Event::Chunk("a".into()));
        recorder.record(&Event::Chunk("b".into()));
        recorder.record(&Event::DraftContent("<p>1</p>".into()));
        recorder.record(&Event::DraftContent("<p>2</p>".into()));
        recorder.record(&Event::Interrupt("need X".into()));
        recorder.record(&Event::Update("node".into()));

        let resolution = recorder.resolution(Outcome::Completed);
        assert_eq!(resolution.chunks, 2);
        assert_eq!(resolution.draft.as_deref(), Some("<p>2</p>"));
        assert_eq!(resolution.interrupt.as_deref(), Some("need X"));
        assert!(resolution.is_completed());
        assert!(resolution.is_interrupted());
    }

    #[tokio::test]
    async fn test_streaming_proxy_forwards_and_settles() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let ends = Arc::new(AtomicUsize::new(0));
        let e = ends.clone();
        let callbacks = Callbacks::new().on_streaming_end(move || {
            e.fetch_add(1, Ordering::SeqCst);
        });
        let (settle, rx) = SettleOnce::new();
        let proxy = streaming_proxy(callbacks, settle);

        proxy(Event::StreamingState(true)).await;
        proxy(Event::StreamingState(false)).await;
        proxy(Event::StreamingState(false)).await;

        assert_eq!(ends.load(Ordering::SeqCst), 2);
        assert_eq!(rx.await.unwrap(), Settlement::Completed);
    }

    #[tokio::test]
    async fn test_recording_handler_forwards_to_inner() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let inner: Handler = Arc::new(move |event: Event| -> BoxFuture<'static, ()> {
            s.lock().unwrap().push(event);
            Box::pin(std::future::ready(()))
        });
        let recorder = Recorder::default();
        let handler = recording_handler(recorder.clone(), Some(inner));

        handler(Event::Chunk("x".into())).await;
        assert_eq!(*seen.lock().unwrap(), vec![Event::Chunk("x".into())]);
        assert_eq!(recorder.resolution(Outcome::ClosedEarly).chunks, 1);
    }

    #[tokio::test]
    async fn test_reconnects_when_closed_before_send() {
        let (connector, mut backend) = MemoryConnector::new();
        let manager = ConnectionManager::new(Arc::new(connector.clone()), Duration::from_secs(10));
        manager.connect().await.unwrap();
        let first_peer = backend.accept().await.unwrap();

        // Hold the registry so the session stops after its open check.
        let registry = manager.registry().lock().await;
        let session = {
            let manager = manager.clone();
            tokio::spawn(async move {
                Session::new(&manager)
                    .run(&GenerateRequest::create("d", "m"), Callbacks::new())
                    .await
            })
        };
        tokio::task::yield_now().await;

        first_peer.close();
        for _ in 0..100 {
            if manager.state().await == ConnectionState::Closed {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(manager.state().await, ConnectionState::Closed);
        drop(registry);

        let mut peer = backend.accept().await.unwrap();
        let request = peer.next_request().await.unwrap();
        assert_eq!(request.document_id, "d");
        peer.send_event(&Event::StreamingState(false));

        let resolution = session.await.unwrap().unwrap();
        assert!(resolution.is_completed());
        assert_eq!(connector.attempts(), 2);
    }
}
