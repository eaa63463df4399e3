//! Abandoned connection tracking.
//!
//! Every established connection is registered with a weak handle to its
//! shared state and an owned handle to its network resources. The tracker
//! never keeps a connection alive. When a connection is dropped without
//! `close()`, its [`TrackingGuard`] posts a notice to a dedicated sweep thread
//! which force-closes the socket and forgets the entry.
//!
//! Cleanup is best-effort: it happens after the drop, on the sweep thread,
//! with no bound on latency.
//!
//! ```rust
//! use std::sync::Arc;
//! use myriad_driver::tracker::AbandonedConnectionTracker;
//! use myriad_driver::NetworkResources;
//! use myriad_url::BoxError;
//!
//! struct Socket;
//!
//! impl NetworkResources for Socket {
//!     fn force_close(&self) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//! }
//!
//! let tracker = AbandonedConnectionTracker::start();
//! let state = Arc::new(());
//! let guard = tracker.register(&state, Arc::new(Socket));
//! assert_eq!(tracker.tracked_count(), 1);
//!
//! // explicit close
//! guard.release_tracking();
//! assert_eq!(tracker.tracked_count(), 0);
//! ```

use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use myriad_url::BoxError;

use crate::connector::NetworkResources;

/// Name of the sweep thread.
pub const SWEEP_THREAD_NAME: &str = "myriad-abandoned-connection-sweep";

static GLOBAL: OnceLock<Arc<AbandonedConnectionTracker>> = OnceLock::new();

/// Failure while force-closing an abandoned connection.
#[derive(Error, Debug)]
pub enum CleanupError {
    /// `force_close` returned an error.
    #[error("failed to release network resources: {0}")]
    Release(#[source] BoxError),

    /// `force_close` panicked.
    #[error("network resource release panicked")]
    Panicked,
}

struct TrackedConnection {
    observed: Weak<dyn Any + Send + Sync>,
    resources: Option<Arc<dyn NetworkResources>>,
}

impl TrackedConnection {
    fn is_reachable(&self) -> bool {
        self.observed.strong_count() > 0
    }

    /// Force-close once; later calls are no-ops returning `Ok(false)`.
    fn cleanup(&mut self) -> Result<bool, CleanupError> {
        let Some(resources) = self.resources.take() else {
            return Ok(false);
        };
        match panic::catch_unwind(AssertUnwindSafe(|| resources.force_close())) {
            Ok(Ok(())) => Ok(true),
            Ok(Err(e)) => Err(CleanupError::Release(e)),
            Err(_) => Err(CleanupError::Panicked),
        }
    }
}

#[derive(Default)]
struct Registry {
    entries: Mutex<HashMap<u64, TrackedConnection>>,
    released: AtomicU64,
}

impl Registry {
    fn insert(&self, id: u64, entry: TrackedConnection) {
        self.entries.lock().insert(id, entry);
    }

    fn deregister(&self, id: u64) -> bool {
        self.entries.lock().remove(&id).is_some()
    }

    /// Remove the entry, then release it outside the lock.
    fn release(&self, id: u64) -> Result<bool, CleanupError> {
        let entry = self.entries.lock().remove(&id);
        let Some(mut entry) = entry else {
            return Ok(false);
        };
        let released = entry.cleanup()?;
        if released {
            self.released.fetch_add(1, Ordering::Relaxed);
        }
        Ok(released)
    }

    fn release_logged(&self, id: u64) {
        match self.release(id) {
            Ok(true) => debug!(connection_id = id, "Released abandoned connection"),
            Ok(false) => {}
            Err(e) => warn!(connection_id = id, error = %e, "Abandoned connection cleanup failed"),
        }
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Process-scoped registry of live connections plus its sweep thread.
pub struct AbandonedConnectionTracker {
    registry: Arc<Registry>,
    notices: mpsc::UnboundedSender<u64>,
    next_id: AtomicU64,
}

impl AbandonedConnectionTracker {
    /// Create a tracker and start its sweep thread.
    ///
    /// The thread runs until the tracker and every guard it handed out are
    /// dropped. If the thread cannot be spawned, guards release inline on
    /// drop instead.
    pub fn start() -> Arc<Self> {
        let (notices, rx) = mpsc::unbounded_channel();
        let registry = Arc::new(Registry::default());

        let sweep_registry = Arc::clone(&registry);
        let spawned = std::thread::Builder::new()
            .name(SWEEP_THREAD_NAME.to_string())
            .spawn(move || sweep(sweep_registry, rx));
        match spawned {
            Ok(_) => info!(thread = SWEEP_THREAD_NAME, "Abandoned connection sweep started"),
            Err(e) => error!(
                error = %e,
                "Failed to start abandoned connection sweep; cleanup will run on drop"
            ),
        }

        Arc::new(Self {
            registry,
            notices,
            next_id: AtomicU64::new(1),
        })
    }

    /// The process-wide tracker, started on first use.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(Self::start))
    }

    /// Track `connection`, holding only a weak handle to it.
    ///
    /// The returned guard must live exactly as long as the connection.
    pub fn register<T>(
        &self,
        connection: &Arc<T>,
        resources: Arc<dyn NetworkResources>,
    ) -> TrackingGuard
    where
        T: Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let observed: Arc<dyn Any + Send + Sync> = connection.clone();

        self.registry.insert(
            id,
            TrackedConnection {
                observed: Arc::downgrade(&observed),
                resources: Some(resources),
            },
        );
        debug!(connection_id = id, "Connection registered for leak tracking");

        TrackingGuard {
            id,
            registry: Arc::clone(&self.registry),
            notices: self.notices.clone(),
            armed: true,
        }
    }

    /// Forget a connection without releasing it.
    pub fn deregister(&self, id: u64) -> bool {
        self.registry.deregister(id)
    }

    /// Force-close and forget a connection.
    ///
    /// Returns `Ok(false)` when the entry is already gone.
    pub fn release(&self, id: u64) -> Result<bool, CleanupError> {
        self.registry.release(id)
    }

    /// Release every entry whose connection no longer exists.
    ///
    /// Returns the number of entries removed.
    pub fn reap_unreachable(&self) -> usize {
        let dead: Vec<u64> = self
            .registry
            .entries
            .lock()
            .iter()
            .filter(|(_, entry)| !entry.is_reachable())
            .map(|(id, _)| *id)
            .collect();

        for id in &dead {
            self.registry.release_logged(*id);
        }
        dead.len()
    }

    /// Check if `id` is still registered.
    pub fn is_tracked(&self, id: u64) -> bool {
        self.registry.entries.lock().contains_key(&id)
    }

    /// Number of registered connections.
    pub fn tracked_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of connections force-closed so far.
    pub fn released_count(&self) -> u64 {
        self.registry.released.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for AbandonedConnectionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbandonedConnectionTracker")
            .field("tracked", &self.tracked_count())
            .field("released", &self.released_count())
            .finish()
    }
}

fn sweep(registry: Arc<Registry>, mut notices: mpsc::UnboundedReceiver<u64>) {
    while let Some(id) = notices.blocking_recv() {
        registry.release_logged(id);
    }
    debug!("Abandoned connection sweep stopped");
}

/// Ties a registration to the lifetime of a connection.
///
/// Dropping an armed guard reports the connection as abandoned.
pub struct TrackingGuard {
    id: u64,
    registry: Arc<Registry>,
    notices: mpsc::UnboundedSender<u64>,
    armed: bool,
}

impl TrackingGuard {
    /// Registration id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Deregister after an explicit close.
    pub fn release_tracking(mut self) -> bool {
        self.armed = false;
        self.registry.deregister(self.id)
    }
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(mpsc::error::SendError(id)) = self.notices.send(self.id) {
            // sweep thread is gone
            self.registry.release_logged(id);
        }
    }
}

impl fmt::Debug for TrackingGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingGuard")
            .field("id", &self.id)
            .field("armed", &self.armed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct CountingSocket {
        closes: AtomicUsize,
    }

    impl NetworkResources for CountingSocket {
        fn force_close(&self) -> Result<(), BoxError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingSocket;

    impl NetworkResources for FailingSocket {
        fn force_close(&self) -> Result<(), BoxError> {
            Err("socket already reset".into())
        }
    }

    struct PanickingSocket;

    impl NetworkResources for PanickingSocket {
        fn force_close(&self) -> Result<(), BoxError> {
            panic!("close exploded");
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn test_dropped_connection_is_released() {
        let tracker = AbandonedConnectionTracker::start();
        let socket = Arc::new(CountingSocket::default());
        let state = Arc::new(String::from("session"));

        let guard = tracker.register(&state, socket.clone());
        let id = guard.id();
        assert!(tracker.is_tracked(id));

        drop(state);
        drop(guard);

        assert!(wait_until(|| !tracker.is_tracked(id)));
        assert!(wait_until(|| socket.closes.load(Ordering::SeqCst) == 1));
        assert_eq!(tracker.released_count(), 1);
    }

    #[test]
    fn test_release_twice_is_noop() {
        let tracker = AbandonedConnectionTracker::start();
        let socket = Arc::new(CountingSocket::default());
        let state = Arc::new(0u8);

        let guard = tracker.register(&state, socket.clone());
        let id = guard.id();

        assert!(tracker.release(id).unwrap());
        assert!(!tracker.release(id).unwrap());
        assert_eq!(socket.closes.load(Ordering::SeqCst), 1);

        // the guard's later notice finds nothing to do
        drop(guard);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(socket.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tracker_holds_no_strong_reference() {
        let tracker = AbandonedConnectionTracker::start();
        let state = Arc::new(());
        let _guard = tracker.register(&state, Arc::new(CountingSocket::default()));
        assert_eq!(Arc::strong_count(&state), 1);
    }

    #[test]
    fn test_explicit_close_skips_cleanup() {
        let tracker = AbandonedConnectionTracker::start();
        let socket = Arc::new(CountingSocket::default());
        let state = Arc::new(());

        let guard = tracker.register(&state, socket.clone());
        assert!(guard.release_tracking());
        assert_eq!(tracker.tracked_count(), 0);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(socket.closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reap_unreachable() {
        let tracker = AbandonedConnectionTracker::start();
        let socket = Arc::new(CountingSocket::default());
        let live = Arc::new(1u32);
        let dead = Arc::new(2u32);

        let _live_guard = tracker.register(&live, Arc::new(CountingSocket::default()));
        let dead_guard = tracker.register(&dead, socket.clone());
        drop(dead);

        assert_eq!(tracker.reap_unreachable(), 1);
        assert_eq!(tracker.tracked_count(), 1);
        assert_eq!(socket.closes.load(Ordering::SeqCst), 1);

        drop(dead_guard);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(socket.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sweep_survives_failures() {
        let tracker = AbandonedConnectionTracker::start();
        let a = Arc::new(());
        let b = Arc::new(());
        let c = Arc::new(());
        let socket = Arc::new(CountingSocket::default());

        let failing = tracker.register(&a, Arc::new(FailingSocket));
        let panicking = tracker.register(&b, Arc::new(PanickingSocket));
        let healthy = tracker.register(&c, socket.clone());

        drop(failing);
        drop(panicking);
        drop(healthy);

        assert!(wait_until(|| socket.closes.load(Ordering::SeqCst) == 1));
        assert!(wait_until(|| tracker.tracked_count() == 0));
    }

    #[test]
    fn test_cleanup_error_reported() {
        let tracker = AbandonedConnectionTracker::start();
        let state = Arc::new(());
        let guard = tracker.register(&state, Arc::new(FailingSocket));
        let err = tracker.release(guard.id()).unwrap_err();
        assert!(matches!(err, CleanupError::Release(_)));
        assert!(!tracker.is_tracked(guard.id()));
    }

    #[test]
    fn test_global_is_shared() {
        let first = AbandonedConnectionTracker::global();
        let second = AbandonedConnectionTracker::global();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
