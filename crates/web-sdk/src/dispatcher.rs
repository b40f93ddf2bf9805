//! Event dispatcher — resolves an event source against the element an event
//! fired on and emits the result to the backend or the debug surface.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};
use trackthat_core::{TrackError, TrackResult, TrackedEvent, TrackerConfig, TrackingBackend};

use crate::dom::Element;
use crate::gate::ActivationGate;
use crate::option::{resolve_optional, OptionRule};
use crate::surface::DebugSurface;

/// Caller-supplied derivation of the whole triple from an element.
pub type DeriveFn = Arc<dyn Fn(&dyn Element) -> TrackedEvent + Send + Sync>;

/// Where a dispatch gets its category, action and label from.
#[derive(Clone)]
pub enum EventSource {
    /// Declarative options resolved against the element.
    Options {
        category: String,
        action: OptionRule,
        label: Option<OptionRule>,
    },
    /// A function producing the triple directly; no option resolution.
    Derive(DeriveFn),
}

impl EventSource {
    pub fn options(category: impl Into<String>, action: OptionRule, label: Option<OptionRule>) -> Self {
        Self::Options {
            category: category.into(),
            action,
            label,
        }
    }

    /// Parse option strings, as in `{category, action, label}` push options.
    pub fn parse(category: impl Into<String>, action: &str, label: Option<&str>) -> TrackResult<Self> {
        Ok(Self::options(
            category,
            OptionRule::parse(action)?,
            OptionRule::parse_optional(label)?,
        ))
    }

    pub fn derive<F>(f: F) -> Self
    where
        F: Fn(&dyn Element) -> TrackedEvent + Send + Sync + 'static,
    {
        Self::Derive(Arc::new(f))
    }

    fn resolve(&self, element: &dyn Element) -> TrackedEvent {
        match self {
            Self::Options {
                category,
                action,
                label,
            } => TrackedEvent {
                category: category.clone(),
                action: action.resolve(element),
                label: resolve_optional(label.as_ref(), element),
            },
            Self::Derive(f) => f(element),
        }
    }
}

impl fmt::Debug for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Options {
                category,
                action,
                label,
            } => f
                .debug_struct("Options")
                .field("category", category)
                .field("action", action)
                .field("label", label)
                .finish(),
            Self::Derive(_) => f.write_str("Derive(..)"),
        }
    }
}

/// What a successful dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Tracking inactive; nothing happened.
    Disabled,
    /// Debug mode; the formatted line went to the debug surface.
    Debugged(String),
    /// One backend call was made with this event.
    Sent(TrackedEvent),
}

pub struct Dispatcher {
    config: TrackerConfig,
    gate: ActivationGate,
    backend: Arc<dyn TrackingBackend>,
    surface: Arc<dyn DebugSurface>,
}

impl Dispatcher {
    pub fn new(
        config: TrackerConfig,
        backend: Arc<dyn TrackingBackend>,
        surface: Arc<dyn DebugSurface>,
    ) -> Self {
        let gate = ActivationGate::new(&config, backend.clone());
        Self {
            config,
            gate,
            backend,
            surface,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn gate(&self) -> &ActivationGate {
        &self.gate
    }

    /// Resolve `source` against `element` and emit it. Blank category or
    /// action is rejected and logged without emitting anything.
    pub fn dispatch(&self, element: &dyn Element, source: &EventSource) -> TrackResult<DispatchOutcome> {
        if !self.gate.is_enabled() {
            return Ok(DispatchOutcome::Disabled);
        }

        let event = source.resolve(element);
        if let Some(field) = event.blank_field() {
            warn!(
                category = %event.category,
                action = %event.action,
                field,
                "tracked event rejected"
            );
            return Err(TrackError::blank(field));
        }

        if self.gate.debug_mode() {
            let line = event.debug_line();
            self.surface.log(&line);
            if self.config.debug_notify {
                self.surface.notify(&line);
            }
            return Ok(DispatchOutcome::Debugged(line));
        }

        debug!(
            kind = %self.config.event_kind,
            category = %event.category,
            action = %event.action,
            label = %event.label,
            "tracked event sent"
        );
        self.backend.track_event(&self.config.event_kind, &event);
        Ok(DispatchOutcome::Sent(event))
    }
}
