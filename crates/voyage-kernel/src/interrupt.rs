use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Shared cancellation flag for a running search.
///
/// Cloned handles observe the same flag; the engine checks it at the top of
/// the expand loop and at each tool-call boundary.
#[derive(Clone)]
pub struct SearchInterrupt {
    pub notify: Arc<Notify>,
    cancelled: Arc<AtomicBool>,
}

impl Default for SearchInterrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchInterrupt {
    pub fn new() -> Self {
        Self {
            notify: Arc::new(Notify::new()),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Trigger cancellation.
    pub fn trigger(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Check whether cancellation was requested.
    pub fn check(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Reset for reuse across runs.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}
