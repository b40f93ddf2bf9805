//! Definition table — turns the compact positional form
//! `[action, label, elements, scope?, event_type?]` into an [`EventDefinition`].

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use trackthat_core::types::is_blank;
use trackthat_core::{TrackError, TrackResult};

use crate::dom::{ElementQuery, ElementSet};
use crate::option::OptionRule;

/// An event definition as supplied by the caller, before parsing.
#[derive(Clone, Default)]
pub struct RawDefinition {
    pub action: Option<String>,
    pub label: Option<String>,
    pub elements: Option<Arc<dyn ElementSet>>,
    pub scope: Option<String>,
    pub event_type: Option<String>,
}

impl RawDefinition {
    /// `[action, label, elements]`. Pass an empty label to omit it.
    pub fn new(
        action: impl Into<String>,
        label: impl Into<String>,
        elements: Arc<dyn ElementSet>,
    ) -> Self {
        Self {
            action: Some(action.into()),
            label: Some(label.into()),
            elements: Some(elements),
            scope: None,
            event_type: None,
        }
    }

    /// Delegate to descendants matching `scope`.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Build from the JSON positional form used by definition files, where the
    /// element set is a selector resolved through `query`.
    pub fn from_positional(
        values: &[serde_json::Value],
        query: &dyn ElementQuery,
    ) -> TrackResult<Self> {
        if !(3..=5).contains(&values.len()) {
            return Err(TrackError::Definition(format!(
                "expected 3 to 5 entries [action, label, elements, scope?, event_type?], got {}",
                values.len()
            )));
        }
        let selector = string_at(values, 2, "elements")?
            .ok_or_else(|| TrackError::Definition("elements selector is required".into()))?;

        Ok(Self {
            action: string_at(values, 0, "action")?,
            label: string_at(values, 1, "label")?,
            elements: Some(query.query(&selector)),
            scope: string_at(values, 3, "scope")?,
            event_type: string_at(values, 4, "event_type")?,
        })
    }
}

impl fmt::Debug for RawDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDefinition")
            .field("action", &self.action)
            .field("label", &self.label)
            .field("elements", &self.elements.as_ref().map(|e| e.len()))
            .field("scope", &self.scope)
            .field("event_type", &self.event_type)
            .finish()
    }
}

fn string_at(values: &[serde_json::Value], idx: usize, what: &str) -> TrackResult<Option<String>> {
    match values.get(idx) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(TrackError::Definition(format!(
            "{what} must be a string or null, got {other}"
        ))),
    }
}

/// A parsed, immutable event definition.
#[derive(Clone)]
pub struct EventDefinition {
    pub action: OptionRule,
    pub label: Option<OptionRule>,
    pub elements: Option<Arc<dyn ElementSet>>,
    pub scope: Option<String>,
    pub event_type: String,
}

impl EventDefinition {
    /// The element set, if there is anything to bind to.
    pub fn bindable_elements(&self) -> Option<&Arc<dyn ElementSet>> {
        self.elements.as_ref().filter(|e| !e.is_empty())
    }
}

impl fmt::Debug for EventDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDefinition")
            .field("action", &self.action)
            .field("label", &self.label)
            .field("elements", &self.elements.as_ref().map(|e| e.len()))
            .field("scope", &self.scope)
            .field("event_type", &self.event_type)
            .finish()
    }
}

/// Parse a raw definition. The action must be non-blank; a blank label, scope
/// or event type counts as absent, and a missing event type falls back to
/// `default_event_type`.
pub fn parse_definition(raw: &RawDefinition, default_event_type: &str) -> TrackResult<EventDefinition> {
    let action = match raw.action.as_deref() {
        Some(a) if !is_blank(a) => OptionRule::parse(a)?,
        _ => return Err(TrackError::blank("action")),
    };
    let label = OptionRule::parse_optional(raw.label.as_deref())?;
    let scope = raw
        .scope
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let event_type = raw
        .event_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default_event_type)
        .to_string();

    Ok(EventDefinition {
        action,
        label,
        elements: raw.elements.clone(),
        scope,
        event_type,
    })
}

/// One category block of a definition file:
/// `{ "category": "Home Page", "events": [["Sidebar", "Callout", "#callout"]] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryDefinitions {
    pub category: String,
    #[serde(default)]
    pub events: Vec<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionFile {
    Many(Vec<CategoryDefinitions>),
    One(CategoryDefinitions),
}

/// Parse a definition file holding one category block or an array of them.
pub fn load_definitions(json: &str) -> TrackResult<Vec<CategoryDefinitions>> {
    Ok(match serde_json::from_str::<DefinitionFile>(json)? {
        DefinitionFile::Many(blocks) => blocks,
        DefinitionFile::One(block) => vec![block],
    })
}
