//! Connection observers.
//!
//! The connection keeps an ordered chain of observers that hear about
//! transport close and transport error. Long-lived observers (diagnostics set
//! up once) stay registered across requests and reconnects. A logical request
//! pushes a scoped observer and the returned [`ObserverGuard`] pops it when
//! dropped, so removal happens on every exit path.
//!
//! Observers are notified in registration order, outside the chain's lock,
//! so an observer may register or remove observers itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Receives connection-level lifecycle notifications.
pub trait ConnectionObserver: Send + Sync {
    /// The peer closed the connection.
    fn on_close(&self) {}

    /// The transport failed.
    fn on_error(&self, error: &str) {
        let _ = error;
    }

    /// `disconnect()` tore the connection down locally.
    fn on_disconnect(&self) {}
}

/// Handle to a long-lived observer, for [`ObserverChain::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct Entry {
    id: u64,
    scoped: bool,
    observer: Arc<dyn ConnectionObserver>,
}

/// Ordered list of observers.
#[derive(Default)]
pub struct ObserverChain {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
}

impl ObserverChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a long-lived observer.
    pub fn push(&self, observer: Arc<dyn ConnectionObserver>) -> ObserverId {
        ObserverId(self.insert(observer, false))
    }

    /// Append a request-scoped observer; it is removed when the guard drops
    /// or when [`clear_scoped`](Self::clear_scoped) runs.
    pub fn push_scoped(self: &Arc<Self>, observer: Arc<dyn ConnectionObserver>) -> ObserverGuard {
        let id = self.insert(observer, true);
        ObserverGuard {
            chain: self.clone(),
            id,
        }
    }

    /// Remove a long-lived observer. Returns true if it was registered.
    pub fn remove(&self, id: ObserverId) -> bool {
        self.remove_id(id.0)
    }

    /// Drop every scoped observer.
    pub fn clear_scoped(&self) {
        self.entries().retain(|entry| !entry.scoped);
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify_close(&self) {
        for observer in self.snapshot() {
            observer.on_close();
        }
    }

    pub fn notify_error(&self, error: &str) {
        for observer in self.snapshot() {
            observer.on_error(error);
        }
    }

    pub fn notify_disconnect(&self) {
        for observer in self.snapshot() {
            observer.on_disconnect();
        }
    }

    fn insert(&self, observer: Arc<dyn ConnectionObserver>, scoped: bool) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries().push(Entry {
            id,
            scoped,
            observer,
        });
        id
    }

    fn remove_id(&self, id: u64) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    fn snapshot(&self) -> Vec<Arc<dyn ConnectionObserver>> {
        self.entries()
            .iter()
            .map(|entry| entry.observer.clone())
            .collect()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes a scoped observer from its chain on drop.
pub struct ObserverGuard {
    chain: Arc<ObserverChain>,
    id: u64,
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.chain.remove_id(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ConnectionObserver for Recorder {
        fn on_close(&self) {
            self.log.lock().unwrap().push(format!("{}:close", self.name));
        }

        fn on_error(&self, error: &str) {
            self.log.lock().unwrap().push(format!("{}:error:{}", self.name, error));
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn ConnectionObserver> {
        Arc::new(Recorder {
            name,
            log: log.clone(),
        })
    }

    #[test]
    fn test_notifies_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = Arc::new(ObserverChain::new());

        chain.push(recorder("diagnostics", &log));
        let _guard = chain.push_scoped(recorder("request", &log));

        chain.notify_close();
        chain.notify_error("reset");

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "diagnostics:close",
                "request:close",
                "diagnostics:error:reset",
                "request:error:reset",
            ]
        );
    }

    #[test]
    fn test_guard_pops_scoped_observer() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = Arc::new(ObserverChain::new());

        chain.push(recorder("diagnostics", &log));
        {
            let _guard = chain.push_scoped(recorder("request", &log));
            assert_eq!(chain.len(), 2);
        }
        assert_eq!(chain.len(), 1);

        chain.notify_close();
        assert_eq!(*log.lock().unwrap(), vec!["diagnostics:close"]);
    }

    #[test]
    fn test_clear_scoped_keeps_long_lived() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = Arc::new(ObserverChain::new());

        let id = chain.push(recorder("diagnostics", &log));
        let guard = chain.push_scoped(recorder("request", &log));
        chain.clear_scoped();
        assert_eq!(chain.len(), 1);

        // Guard dropping after clear is harmless.
        drop(guard);
        assert_eq!(chain.len(), 1);

        assert!(chain.remove(id));
        assert!(!chain.remove(id));
        assert!(chain.is_empty());
    }

    #[test]
    fn test_observer_may_touch_chain_during_notify() {
        struct Reentrant {
            chain: Arc<ObserverChain>,
        }

        impl ConnectionObserver for Reentrant {
            fn on_close(&self) {
                self.chain.clear_scoped();
            }
        }

        let chain = Arc::new(ObserverChain::new());
        let guard = chain.push_scoped(Arc::new(Reentrant {
            chain: chain.clone(),
        }));
        chain.notify_close();
        assert!(chain.is_empty());
        drop(guard);
    }
}
