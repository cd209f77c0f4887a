//! Reachability-based release of remote callables
//!
//! Every registered [`CallableId`] gets a [`ReleaseGuard`]; when the guard is
//! dropped (i.e. the last proxy handle holding it goes away) the tracker fires
//! its release callback exactly once for that id. The production callback
//! forwards `releaseCallable` to the backend, best-effort.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use trellis_protocol::{RELEASE_CALLABLE, Transport};

use crate::callable::CallableId;

/// Registry associating live proxies with their remote callable ids
///
/// The tracker stores only ids, never the proxies themselves, so a
/// registration can never be what keeps a proxy alive. All state is behind a
/// mutex; registration, release and decode may run concurrently.
pub struct CallableTracker {
    live: Mutex<HashSet<CallableId>>,
    on_release: Box<dyn Fn(CallableId) + Send + Sync>,
}

impl CallableTracker {
    /// Create a tracker with a custom release callback
    pub fn new(on_release: impl Fn(CallableId) + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            live: Mutex::new(HashSet::new()),
            on_release: Box::new(on_release),
        })
    }

    /// Create a tracker whose releases are forwarded to the backend
    ///
    /// Spawns a worker draining release notifications and issuing
    /// `releaseCallable` for each. A failed release is logged and dropped:
    /// the local proxy is already gone and nothing can observe the outcome.
    ///
    /// Must be called from within a tokio runtime.
    pub fn for_transport(client: Arc<dyn Transport>) -> Arc<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<CallableId>();

        tokio::spawn(async move {
            while let Some(id) = rx.recv().await {
                let params = vec![Value::String(id.to_string())];
                match client.request(RELEASE_CALLABLE, params).await {
                    Ok(_) => debug!("released remote callable '{}'", id),
                    Err(e) => warn!("failed to release remote callable '{}': {}", id, e),
                }
            }
        });

        Self::new(move |id| {
            // Worker gone means the runtime is shutting down; nothing to do
            let _ = tx.send(id);
        })
    }

    /// Register a callable id, returning the guard that will release it
    ///
    /// Registering an id that is already live is allowed (separate decode
    /// sites may materialize proxies for the same id); the release still
    /// happens at most once.
    pub fn register(self: &Arc<Self>, id: CallableId) -> ReleaseGuard {
        self.live.lock().unwrap().insert(id.clone());
        ReleaseGuard {
            id,
            tracker: Arc::clone(self),
        }
    }

    /// Number of callable ids currently live
    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    /// Whether the given id is registered and not yet released
    pub fn is_live(&self, id: &CallableId) -> bool {
        self.live.lock().unwrap().contains(id)
    }

    fn notify_release(&self, id: &CallableId) {
        let was_live = self.live.lock().unwrap().remove(id);
        if was_live {
            (self.on_release)(id.clone());
        } else {
            // Already released through another guard for the same id
            debug!("ignoring duplicate release for callable '{}'", id);
        }
    }
}

/// Owned handle tying a [`CallableId`]'s remote lifetime to local reachability
///
/// Dropping the guard notifies the tracker. Keeping it reachable forever
/// (e.g. captured in a long-lived closure) means the remote resource is never
/// released, which mirrors the reachability contract.
pub struct ReleaseGuard {
    id: CallableId,
    tracker: Arc<CallableTracker>,
}

impl ReleaseGuard {
    pub fn id(&self) -> &CallableId {
        &self.id
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.tracker.notify_release(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capturing_tracker() -> (Arc<CallableTracker>, Arc<Mutex<Vec<CallableId>>>) {
        let released = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&released);
        let tracker = CallableTracker::new(move |id| sink.lock().unwrap().push(id));
        (tracker, released)
    }

    #[test]
    fn test_release_fires_on_guard_drop() {
        let (tracker, released) = capturing_tracker();

        let guard = tracker.register(CallableId::from("cb-1"));
        assert_eq!(tracker.live_count(), 1);
        assert!(released.lock().unwrap().is_empty());

        drop(guard);
        assert_eq!(tracker.live_count(), 0);
        assert_eq!(*released.lock().unwrap(), vec![CallableId::from("cb-1")]);
    }

    #[test]
    fn test_release_at_most_once_per_id() {
        let (tracker, released) = capturing_tracker();

        // Two decode sites can register the same id independently
        let first = tracker.register(CallableId::from("cb-1"));
        let second = tracker.register(CallableId::from("cb-1"));
        assert_eq!(tracker.live_count(), 1);

        drop(first);
        drop(second);
        assert_eq!(released.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_distinct_ids_release_independently() {
        let (tracker, released) = capturing_tracker();

        let a = tracker.register(CallableId::from("cb-a"));
        let b = tracker.register(CallableId::from("cb-b"));
        assert_eq!(tracker.live_count(), 2);

        drop(b);
        assert!(tracker.is_live(&CallableId::from("cb-a")));
        assert!(!tracker.is_live(&CallableId::from("cb-b")));

        drop(a);
        assert_eq!(released.lock().unwrap().len(), 2);
    }
}
