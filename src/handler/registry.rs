//! Callback registry for dispatching events by kind.
//!
//! The registry maps each [`EventKind`] to at most one handler. It holds the
//! handlers of the single in-flight logical request; the session installs a
//! [`Callbacks`] set at send-time and clears the registry on resolution.
//!
//! # Example
//!
//! ```
//! use draftwire_client::handler::{CallbackRegistry, Callbacks};
//! use draftwire_client::protocol::{Event, EventKind};
//!
//! # tokio_test_block_on(async {
//! let mut registry = CallbackRegistry::new();
//! registry.install(&Callbacks::new().on_chunk(|chunk| print!("{chunk}")));
//!
//! assert!(registry.contains(EventKind::Chunk));
//! assert!(registry.dispatch(Event::Chunk("hi".into())).await);
//! assert!(!registry.dispatch(Event::Update("node".into())).await);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     futures::executor::block_on(f)
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::callbacks::{AsyncTextCallback, Callbacks, SignalCallback, TextCallback};
use crate::protocol::{Event, EventKind};

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A registered event handler. Receives the whole event; the future is
/// awaited before the next event is dispatched.
pub type Handler = Arc<dyn Fn(Event) -> BoxFuture<'static, ()> + Send + Sync>;

/// Registry mapping event kinds to handlers.
#[derive(Default)]
pub struct CallbackRegistry {
    handlers: HashMap<EventKind, Handler>,
}

impl CallbackRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a kind, replacing any previous one.
    pub fn register(&mut self, kind: EventKind, handler: Handler) {
        self.handlers.insert(kind, handler);
    }

    /// Register a synchronous handler.
    pub fn register_fn<F>(&mut self, kind: EventKind, f: F)
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        self.register(
            kind,
            Arc::new(move |event| -> BoxFuture<'static, ()> {
                f(event);
                Box::pin(std::future::ready(()))
            }),
        );
    }

    /// Install every handler present in a callback set.
    ///
    /// Kinds the set leaves empty keep whatever was registered before.
    pub fn install(&mut self, callbacks: &Callbacks) {
        if let Some(cb) = &callbacks.on_chunk {
            self.register(EventKind::Chunk, text_handler(cb.clone()));
        }
        if let Some(cb) = &callbacks.on_draft_content {
            self.register(EventKind::DraftContent, async_text_handler(cb.clone()));
        }
        if let Some(cb) = &callbacks.on_update {
            self.register(EventKind::Update, text_handler(cb.clone()));
        }
        if let Some(cb) = &callbacks.on_interrupt {
            self.register(EventKind::Interrupt, async_text_handler(cb.clone()));
        }
        if let Some(cb) = &callbacks.on_error {
            self.register(EventKind::Error, text_handler(cb.clone()));
        }
        if callbacks.has_streaming() {
            let start = callbacks.on_streaming_start.clone();
            let end = callbacks.on_streaming_end.clone();
            self.register(EventKind::Streaming, streaming_handler(start, end));
        }
    }

    /// Remove the handler for a kind. Returns true if one was registered.
    pub fn remove(&mut self, kind: EventKind) -> bool {
        self.handlers.remove(&kind).is_some()
    }

    /// Remove every handler.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Check whether a kind has a handler.
    pub fn contains(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Clone out the handler for a kind.
    ///
    /// Lets a caller holding the registry behind a lock release the lock
    /// before awaiting the handler.
    pub fn handler(&self, kind: EventKind) -> Option<Handler> {
        self.handlers.get(&kind).cloned()
    }

    /// Dispatch an event to its handler and await it.
    ///
    /// Returns false if no handler is registered for the event's kind.
    pub async fn dispatch(&self, event: Event) -> bool {
        match self.handler(event.kind()) {
            Some(handler) => {
                handler(event).await;
                true
            }
            None => false,
        }
    }
}

fn text_handler(cb: TextCallback) -> Handler {
    Arc::new(move |event: Event| -> BoxFuture<'static, ()> {
        if let Some(text) = event.into_text() {
            cb(text);
        }
        Box::pin(std::future::ready(()))
    })
}

fn async_text_handler(cb: AsyncTextCallback) -> Handler {
    Arc::new(move |event: Event| -> BoxFuture<'static, ()> {
        match event.into_text() {
            Some(text) => cb(text),
            None => Box::pin(std::future::ready(())),
        }
    })
}

fn streaming_handler(start: Option<SignalCallback>, end: Option<SignalCallback>) -> Handler {
    Arc::new(move |event: Event| -> BoxFuture<'static, ()> {
        match event {
            Event::StreamingState(true) => {
                if let Some(cb) = &start {
                    cb();
                }
            }
            Event::StreamingState(false) => {
                if let Some(cb) = &end {
                    cb();
                }
            }
            _ => {}
        }
        Box::pin(std::future::ready(()))
    })
}
