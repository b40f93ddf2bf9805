use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::types::TRACK_EVENT_KIND;

/// Tracker configuration. Loaded from environment variables with the prefix
/// `TRACK_THAT__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Replace backend emission with local debug output.
    #[serde(default)]
    pub debug_mode: bool,
    /// In debug mode, also raise the blocking notification.
    #[serde(default = "default_debug_notify")]
    pub debug_notify: bool,
    /// Event type used when a definition leaves it blank.
    #[serde(default = "default_event_type")]
    pub default_event_type: String,
    /// Event kind literal handed to the backend.
    #[serde(default = "default_event_kind")]
    pub event_kind: String,
}

fn default_debug_notify() -> bool {
    true
}
fn default_event_type() -> String {
    "click".to_string()
}
fn default_event_kind() -> String {
    TRACK_EVENT_KIND.to_string()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            debug_mode: false,
            debug_notify: default_debug_notify(),
            default_event_type: default_event_type(),
            event_kind: default_event_kind(),
        }
    }
}

impl TrackerConfig {
    /// Debug-mode configuration, as used when testing locally.
    pub fn debug() -> Self {
        Self {
            debug_mode: true,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables only.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from an optional TOML file, then environment
    /// variables, which take precedence.
    pub fn load_from(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config: Self = builder
            .add_source(
                config::Environment::with_prefix("TRACK_THAT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        debug!(
            file = ?file,
            debug_mode = config.debug_mode,
            debug_notify = config.debug_notify,
            default_event_type = %config.default_event_type,
            event_kind = %config.event_kind,
            "tracker config loaded"
        );
        Ok(config)
    }
}
