//! Classic Google Analytics adaptor — produces the command arrays pushed onto
//! the asynchronous `_gaq` queue, e.g.
//! `["_trackEvent", "Home Page", "Sidebar", "Callout Click"]`.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use trackthat_core::TrackedEvent;

use super::WebAdaptor;

/// Configuration for the GA adaptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaConfig {
    /// Name of the page's command queue global (default: "_gaq").
    pub queue_name: String,
    /// Web property ID, e.g. "UA-XXXXX-Y". Optional, the page snippet usually
    /// sets it with `_setAccount`.
    pub account_id: Option<String>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            queue_name: "_gaq".into(),
            account_id: None,
        }
    }
}

/// Classic Google Analytics adaptor.
pub struct GaAdaptor {
    config: GaConfig,
}

impl GaAdaptor {
    pub fn new(config: GaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }
}

impl WebAdaptor for GaAdaptor {
    fn platform(&self) -> &str {
        "ga"
    }

    fn transform(&self, kind: &str, event: &TrackedEvent) -> Result<serde_json::Value> {
        let command = serde_json::json!([kind, event.category, event.action, event.label]);

        debug!(
            queue = %self.config.queue_name,
            kind,
            "GA command transformed"
        );

        Ok(command)
    }

    fn validate_config(&self) -> Result<()> {
        if self.config.queue_name.is_empty() {
            return Err(anyhow!("GA queue_name must not be empty"));
        }
        if let Some(ref account) = self.config.account_id {
            if !account.starts_with("UA-") {
                return Err(anyhow!(
                    "GA account_id must start with 'UA-', got '{}'",
                    account
                ));
            }
        }
        Ok(())
    }
}
