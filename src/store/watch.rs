//! Live-watch plumbing for the subscription store.
//!
//! A watch delivers the current matching state immediately on registration
//! and again after every mutation that touches the watched owner, until the
//! handle is cancelled or dropped. Delivery is push-based over unbounded
//! channels so publishing never blocks the mutation path; duplicate
//! deliveries of an unchanged state are acceptable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;

static WATCHER_COUNTER: AtomicU64 = AtomicU64::new(1);

struct Watcher<T> {
    id: u64,
    owner_id: String,
    tx: mpsc::UnboundedSender<T>,
}

/// Registry of active watchers for one kind of pushed value.
pub(crate) struct WatcherRegistry<T> {
    inner: Arc<Mutex<Vec<Watcher<T>>>>,
}

impl<T> Default for WatcherRegistry<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone + Send + 'static> WatcherRegistry<T> {
    /// Register a watcher scoped to `owner_id` and deliver `initial` to it
    /// immediately.
    pub(crate) fn register(
        &self,
        owner_id: &str,
        initial: T,
    ) -> (mpsc::UnboundedReceiver<T>, WatchHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = WATCHER_COUNTER.fetch_add(1, Ordering::Relaxed);

        // The receiver was just created, so this send cannot fail.
        let _ = tx.send(initial);

        if let Ok(mut watchers) = self.inner.lock() {
            watchers.push(Watcher {
                id,
                owner_id: owner_id.to_owned(),
                tx,
            });
        }

        let registry: Weak<Mutex<Vec<Watcher<T>>>> = Arc::downgrade(&self.inner);
        let handle = WatchHandle {
            cancel: Some(Box::new(move || {
                if let Some(inner) = registry.upgrade() {
                    if let Ok(mut watchers) = inner.lock() {
                        watchers.retain(|w| w.id != id);
                    }
                }
            })),
        };

        (rx, handle)
    }

    /// Push `value` to every watcher scoped to `owner_id`, pruning watchers
    /// whose receiver has gone away.
    pub(crate) fn publish(&self, owner_id: &str, value: &T) {
        let Ok(mut watchers) = self.inner.lock() else {
            return;
        };
        watchers.retain(|w| {
            if w.owner_id != owner_id {
                return true;
            }
            w.tx.send(value.clone()).is_ok()
        });
    }

    /// True if at least one watcher is scoped to `owner_id`.
    pub(crate) fn has_watchers(&self, owner_id: &str) -> bool {
        self.inner
            .lock()
            .map(|watchers| watchers.iter().any(|w| w.owner_id == owner_id))
            .unwrap_or(false)
    }
}

/// Cancellation handle for a live watch.
///
/// Cancelling (or dropping) the handle removes the watcher from the
/// registry; no further values are delivered after that.
pub struct WatchHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchHandle {
    /// Stop the watch. Equivalent to dropping the handle.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn register_delivers_initial_value_immediately() {
        let registry = WatcherRegistry::<u32>::default();
        let (mut rx, _handle) = registry.register("alice", 7);
        assert_eq!(rx.try_recv().unwrap(), 7);
    }

    #[test]
    fn publish_reaches_only_matching_owner() {
        let registry = WatcherRegistry::<u32>::default();
        let (mut alice_rx, _alice) = registry.register("alice", 0);
        let (mut bob_rx, _bob) = registry.register("bob", 0);
        let _ = alice_rx.try_recv();
        let _ = bob_rx.try_recv();

        registry.publish("alice", &42);
        assert_eq!(alice_rx.try_recv().unwrap(), 42);
        assert!(bob_rx.try_recv().is_err());
    }

    #[test]
    fn cancel_stops_delivery() {
        let registry = WatcherRegistry::<u32>::default();
        let (mut rx, handle) = registry.register("alice", 0);
        let _ = rx.try_recv();

        handle.cancel();
        registry.publish("alice", &1);
        assert!(rx.try_recv().is_err());
        assert!(!registry.has_watchers("alice"));
    }

    #[test]
    fn drop_stops_delivery() {
        let registry = WatcherRegistry::<u32>::default();
        let (mut rx, handle) = registry.register("alice", 0);
        let _ = rx.try_recv();

        drop(handle);
        registry.publish("alice", &1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_receivers_are_pruned_on_publish() {
        let registry = WatcherRegistry::<u32>::default();
        let (rx, _handle) = registry.register("alice", 0);
        drop(rx);

        registry.publish("alice", &1);
        assert!(!registry.has_watchers("alice"));
    }
}
