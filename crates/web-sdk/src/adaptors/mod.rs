//! Adaptors for translating tracked events into third-party analytics
//! command formats.
//!
//! Each adaptor implements [`WebAdaptor`] to turn a [`TrackedEvent`] into the
//! JSON command its platform's page snippet expects (the classic Google
//! Analytics `_gaq` queue, a Google Tag Manager `dataLayer`, ...).
//! [`QueueBackend`] wraps an adaptor into a [`TrackingBackend`].

pub mod ga;
pub mod gtm;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use tracing::{debug, warn};
use trackthat_core::{TrackedEvent, TrackingBackend};

/// Adaptor trait — transforms tracked events into a platform-specific JSON
/// command.
pub trait WebAdaptor: Send + Sync {
    /// Platform identifier (e.g. "ga", "gtm").
    fn platform(&self) -> &str;

    /// Transform an event of the given kind into the platform's command.
    fn transform(&self, kind: &str, event: &TrackedEvent) -> Result<serde_json::Value>;

    /// Validate that the adaptor configuration is correct.
    fn validate_config(&self) -> Result<()>;
}

/// Backend that pushes adaptor output onto an in-memory command queue, the
/// way a page pushes onto `_gaq` or `dataLayer` before the vendor script
/// drains it. Not ready until [`install`](Self::install) is called.
pub struct QueueBackend<A: WebAdaptor> {
    adaptor: A,
    installed: AtomicBool,
    queue: Mutex<Vec<serde_json::Value>>,
}

impl<A: WebAdaptor> QueueBackend<A> {
    pub fn new(adaptor: A) -> Self {
        Self {
            adaptor,
            installed: AtomicBool::new(false),
            queue: Mutex::new(Vec::new()),
        }
    }

    pub fn adaptor(&self) -> &A {
        &self.adaptor
    }

    /// Mark the vendor script as loaded.
    pub fn install(&self) {
        self.installed.store(true, Ordering::SeqCst);
    }

    pub fn uninstall(&self) {
        self.installed.store(false, Ordering::SeqCst);
    }

    /// Snapshot of the queued commands.
    pub fn queue(&self) -> Vec<serde_json::Value> {
        self.queue.lock().expect("command queue mutex poisoned").clone()
    }

    /// Take every queued command, leaving the queue empty.
    pub fn drain(&self) -> Vec<serde_json::Value> {
        std::mem::take(&mut *self.queue.lock().expect("command queue mutex poisoned"))
    }
}

impl<A: WebAdaptor> TrackingBackend for QueueBackend<A> {
    fn is_ready(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    fn track_event(&self, kind: &str, event: &TrackedEvent) {
        match self.adaptor.transform(kind, event) {
            Ok(command) => {
                debug!(platform = self.adaptor.platform(), "command queued");
                self.queue
                    .lock()
                    .expect("command queue mutex poisoned")
                    .push(command);
            }
            Err(e) => warn!(
                platform = self.adaptor.platform(),
                error = %e,
                "event dropped by adaptor"
            ),
        }
    }
}
