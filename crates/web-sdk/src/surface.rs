//! Debug surfaces — where debug-mode events go instead of the backend.

use std::sync::Mutex;

use tracing::{info, warn};

/// Local output for debug mode: a log sink plus a blocking, user-visible
/// notification (an `alert()` in a browser host).
pub trait DebugSurface: Send + Sync {
    fn log(&self, line: &str);
    fn notify(&self, line: &str);
}

/// Surface that writes both channels through `tracing`.
pub struct TracingSurface;

impl DebugSurface for TracingSurface {
    fn log(&self, line: &str) {
        info!(event = line, "debug event");
    }

    fn notify(&self, line: &str) {
        warn!(event = line, "debug notification");
    }
}

/// In-memory surface that captures output for testing.
#[derive(Default)]
pub struct CaptureSurface {
    logs: Mutex<Vec<String>>,
    notifications: Mutex<Vec<String>>,
}

impl CaptureSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().expect("surface mutex poisoned").clone()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.notifications
            .lock()
            .expect("surface mutex poisoned")
            .clone()
    }
}

impl DebugSurface for CaptureSurface {
    fn log(&self, line: &str) {
        self.logs
            .lock()
            .expect("surface mutex poisoned")
            .push(line.to_string());
    }

    fn notify(&self, line: &str) {
        self.notifications
            .lock()
            .expect("surface mutex poisoned")
            .push(line.to_string());
    }
}
