//! Google Tag Manager adaptor — transforms tracked events into `dataLayer`
//! push objects picked up by a GTM custom-event trigger.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use trackthat_core::TrackedEvent;

use super::WebAdaptor;

/// Configuration for the GTM adaptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GtmConfig {
    /// GTM container ID, e.g. "GTM-XXXXXXX".
    pub container_id: String,
    /// Custom dataLayer variable name (default: "dataLayer").
    pub data_layer_name: String,
    /// Value of the `event` key the container's trigger listens for
    /// (default: "trackEvent").
    pub event_name: String,
}

impl Default for GtmConfig {
    fn default() -> Self {
        Self {
            container_id: String::new(),
            data_layer_name: "dataLayer".into(),
            event_name: "trackEvent".into(),
        }
    }
}

/// Google Tag Manager adaptor.
pub struct GtmAdaptor {
    config: GtmConfig,
}

impl GtmAdaptor {
    pub fn new(config: GtmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GtmConfig {
        &self.config
    }
}

impl WebAdaptor for GtmAdaptor {
    fn platform(&self) -> &str {
        "gtm"
    }

    fn transform(&self, _kind: &str, event: &TrackedEvent) -> Result<serde_json::Value> {
        let payload = serde_json::json!({
            "event": self.config.event_name,
            "eventCategory": event.category,
            "eventAction": event.action,
            "eventLabel": event.label,
        });

        debug!(
            data_layer = %self.config.data_layer_name,
            event_name = %self.config.event_name,
            container_id = %self.config.container_id,
            "GTM dataLayer push transformed"
        );

        Ok(payload)
    }

    fn validate_config(&self) -> Result<()> {
        if self.config.container_id.is_empty() {
            return Err(anyhow!("GTM container_id must not be empty"));
        }
        if !self.config.container_id.starts_with("GTM-") {
            return Err(anyhow!(
                "GTM container_id must start with 'GTM-', got '{}'",
                self.config.container_id
            ));
        }
        if self.config.data_layer_name.is_empty() {
            return Err(anyhow!("GTM data_layer_name must not be empty"));
        }
        if self.config.event_name.is_empty() {
            return Err(anyhow!("GTM event_name must not be empty"));
        }
        Ok(())
    }
}
