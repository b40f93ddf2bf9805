//! Activation gate — whether tracking does anything at all.

use std::sync::Arc;

use trackthat_core::{TrackerConfig, TrackingBackend};

/// Tracking is enabled when the backend reports itself ready or debug mode
/// is on. Readiness is asked on every call, never cached.
#[derive(Clone)]
pub struct ActivationGate {
    debug_mode: bool,
    backend: Arc<dyn TrackingBackend>,
}

impl ActivationGate {
    pub fn new(config: &TrackerConfig, backend: Arc<dyn TrackingBackend>) -> Self {
        Self {
            debug_mode: config.debug_mode,
            backend,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.debug_mode || self.backend.is_ready()
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }
}
