//! Caller-supplied callback set for one logical request.
//!
//! `on_draft_content` and `on_interrupt` are asynchronous: the session awaits
//! them before reading the next frame. All other callbacks are plain
//! closures.
//!
//! # Example
//!
//! ```
//! use draftwire_client::Callbacks;
//!
//! let callbacks = Callbacks::new()
//!     .on_chunk(|chunk| print!("{chunk}"))
//!     .on_draft_content(|html| async move {
//!         // persist the draft somewhere
//!         let _ = html;
//!     })
//!     .on_streaming_end(|| println!());
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::registry::BoxFuture;

/// Synchronous text callback.
pub type TextCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Asynchronous text callback, awaited by the session.
pub type AsyncTextCallback = Arc<dyn Fn(String) -> BoxFuture<'static, ()> + Send + Sync>;

/// Payload-less notification.
pub type SignalCallback = Arc<dyn Fn() + Send + Sync>;

/// Handlers for the events of one logical request.
///
/// Cheap to clone; every handler is reference counted.
#[derive(Clone, Default)]
pub struct Callbacks {
    pub(crate) on_chunk: Option<TextCallback>,
    pub(crate) on_draft_content: Option<AsyncTextCallback>,
    pub(crate) on_update: Option<TextCallback>,
    pub(crate) on_interrupt: Option<AsyncTextCallback>,
    pub(crate) on_streaming_start: Option<SignalCallback>,
    pub(crate) on_streaming_end: Option<SignalCallback>,
    pub(crate) on_error: Option<TextCallback>,
}

impl Callbacks {
    /// Empty callback set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Incremental text chunk.
    pub fn on_chunk<F>(mut self, f: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.on_chunk = Some(Arc::new(f));
        self
    }

    /// Draft checkpoint. Awaited before the next frame is processed.
    pub fn on_draft_content<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_draft_content = Some(Arc::new(move |content| -> BoxFuture<'static, ()> {
            Box::pin(f(content))
        }));
        self
    }

    /// Backend node progress.
    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(f));
        self
    }

    /// Missing-information interrupt. Awaited before the next frame is processed.
    pub fn on_interrupt<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_interrupt = Some(Arc::new(move |payload| -> BoxFuture<'static, ()> {
            Box::pin(f(payload))
        }));
        self
    }

    /// `streaming: true` received.
    pub fn on_streaming_start<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_streaming_start = Some(Arc::new(f));
        self
    }

    /// `streaming: false` received.
    pub fn on_streaming_end<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_streaming_end = Some(Arc::new(f));
        self
    }

    /// Backend `error` payload. Informational; does not end the request.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// True if either streaming callback is set.
    pub(crate) fn has_streaming(&self) -> bool {
        self.on_streaming_start.is_some() || self.on_streaming_end.is_some()
    }

    /// Run `on_streaming_start` / `on_streaming_end` for a streaming transition.
    pub(crate) fn notify_streaming(&self, streaming: bool) {
        let callback = if streaming {
            &self.on_streaming_start
        } else {
            &self.on_streaming_end
        };
        if let Some(cb) = callback {
            cb();
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_chunk", &self.on_chunk.is_some())
            .field("on_draft_content", &self.on_draft_content.is_some())
            .field("on_update", &self.on_update.is_some())
            .field("on_interrupt", &self.on_interrupt.is_some())
            .field("on_streaming_start", &self.on_streaming_start.is_some())
            .field("on_streaming_end", &self.on_streaming_end.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_empty_callbacks() {
        let callbacks = Callbacks::new();
        assert!(!callbacks.has_streaming());
        assert!(callbacks.on_chunk.is_none());
        // No handlers set: notifying is a no-op.
        callbacks.notify_streaming(true);
        callbacks.notify_streaming(false);
    }

    #[test]
    fn test_notify_streaming_routes_by_flag() {
        let starts = Arc::new(AtomicUsize::new(0));
        let ends = Arc::new(AtomicUsize::new(0));

        let s = starts.clone();
        let e = ends.clone();
        let callbacks = Callbacks::new()
            .on_streaming_start(move || {
                s.fetch_add(1, Ordering::SeqCst);
            })
            .on_streaming_end(move || {
                e.fetch_add(1, Ordering::SeqCst);
            });

        callbacks.notify_streaming(true);
        callbacks.notify_streaming(false);
        callbacks.notify_streaming(false);

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(ends.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_async_callback_is_awaitable() {
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        let callbacks = Callbacks::new().on_draft_content(move |html| {
            let s = s.clone();
            async move {
                tokio::task::yield_now().await;
                s.fetch_add(html.len(), Ordering::SeqCst);
            }
        });

        let cb = callbacks.on_draft_content.clone().unwrap();
        cb("<p></p>".to_string()).await;
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_debug_lists_set_handlers() {
        let callbacks = Callbacks::new().on_chunk(|_| {});
        let debug = format!("{:?}", callbacks);
        assert!(debug.contains("on_chunk: true"));
        assert!(debug.contains("on_update: false"));
    }
}
