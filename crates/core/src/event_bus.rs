//! Backend seam — the trait every analytics integration implements.
//!
//! The tracker never talks to an analytics SDK directly. It holds an
//! `Arc<dyn TrackingBackend>`, asks it whether it is ready on every dispatch,
//! and hands it resolved events fire-and-forget.

use crate::types::TrackedEvent;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Trait for submitting tracked events to an analytics backend.
pub trait TrackingBackend: Send + Sync {
    /// Whether the backend is loaded and accepting events. Checked on every
    /// dispatch since backends may load after listeners are bound.
    fn is_ready(&self) -> bool {
        true
    }

    /// Submit one event. No result is observed by the tracker.
    fn track_event(&self, kind: &str, event: &TrackedEvent);
}

/// Backend that is never ready and drops everything.
pub struct NoOpBackend;

impl TrackingBackend for NoOpBackend {
    fn is_ready(&self) -> bool {
        false
    }

    fn track_event(&self, _kind: &str, _event: &TrackedEvent) {}
}

/// A backend call recorded by [`CaptureBackend`].
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub kind: String,
    pub event: TrackedEvent,
    pub received_at: DateTime<Utc>,
}

/// In-memory backend that captures calls for testing.
pub struct CaptureBackend {
    ready: AtomicBool,
    calls: Mutex<Vec<CapturedCall>>,
}

impl Default for CaptureBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend {
    pub fn new() -> Self {
        Self {
            ready: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Toggle readiness, simulating the backend script loading or unloading.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<CapturedCall> {
        self.calls.lock().expect("capture backend mutex poisoned").clone()
    }

    pub fn events(&self) -> Vec<TrackedEvent> {
        self.calls().into_iter().map(|c| c.event).collect()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().expect("capture backend mutex poisoned").len()
    }

    pub fn clear(&self) {
        self.calls.lock().expect("capture backend mutex poisoned").clear();
    }
}

impl TrackingBackend for CaptureBackend {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn track_event(&self, kind: &str, event: &TrackedEvent) {
        self.calls
            .lock()
            .expect("capture backend mutex poisoned")
            .push(CapturedCall {
                kind: kind.to_string(),
                event: event.clone(),
                received_at: Utc::now(),
            });
    }
}

/// Convenience: a backend for callers with no analytics installed.
pub fn noop_backend() -> Arc<dyn TrackingBackend> {
    Arc::new(NoOpBackend)
}

/// Convenience: create a capture backend for tests.
pub fn capture_backend() -> Arc<CaptureBackend> {
    Arc::new(CaptureBackend::new())
}
