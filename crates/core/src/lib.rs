//! Shared building blocks for track-that — the tracked event triple, the
//! error taxonomy, tracker configuration, and the backend seam every
//! analytics integration plugs into.

pub mod config;
pub mod error;
pub mod event_bus;
pub mod types;

pub use config::TrackerConfig;
pub use error::{TrackError, TrackResult};
pub use event_bus::TrackingBackend;
pub use types::TrackedEvent;
