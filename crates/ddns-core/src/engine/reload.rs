//! Edge-triggered domain reload requests
//!
//! Requests are idempotent: any number of `request()` calls before the engine
//! checks collapse into one reload.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Cloneable trigger for re-reading the domain list
///
/// The daemon wires SIGHUP to [`ReloadHandle::request`]; any other caller
/// (tests, embedding applications) may do the same.
#[derive(Debug, Clone, Default)]
pub struct ReloadHandle {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ReloadHandle {
    /// Create a handle with no pending request
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the engine to reload its domain list at the next opportunity
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Whether a reload is pending
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Consume the pending request, if any
    pub(crate) fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }

    /// Wait until `request()` is called
    pub(crate) async fn notified(&self) {
        self.notify.notified().await;
    }
}
