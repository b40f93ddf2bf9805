//! Option grammar — declarative rules that produce the action or label
//! string for the element an event fired on.
//!
//! | Written as   | Resolves to                         |
//! |--------------|-------------------------------------|
//! | `val()`      | the element's current form value    |
//! | `text()`     | the element's text content          |
//! | `attr:NAME`  | attribute `NAME`                    |
//! | `prop:NAME`  | DOM property `NAME`                 |
//! | `data:KEY`   | dataset entry `KEY`                 |
//! | anything else| the string itself                   |
//!
//! Options are parsed once when definitions are bound and resolved on every
//! event, so they always reflect the element's current state.

use std::fmt;
use std::str::FromStr;

use trackthat_core::{TrackError, TrackResult};

use crate::dom::Element;

const VALUE: &str = "val()";
const TEXT: &str = "text()";
const ATTR_PREFIX: &str = "attr:";
const PROP_PREFIX: &str = "prop:";
const DATA_PREFIX: &str = "data:";

/// A parsed option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionRule {
    Literal(String),
    ElementValue,
    ElementText,
    ElementAttr(String),
    ElementProp(String),
    ElementData(String),
}

impl OptionRule {
    pub fn literal(s: impl Into<String>) -> Self {
        Self::Literal(s.into())
    }

    /// Parse an option string. Blank input is an empty literal.
    pub fn parse(raw: &str) -> TrackResult<Self> {
        if raw == VALUE {
            return Ok(Self::ElementValue);
        }
        if raw == TEXT {
            return Ok(Self::ElementText);
        }
        let dynamic: [(&str, fn(String) -> Self, &str); 3] = [
            (ATTR_PREFIX, Self::ElementAttr, "attribute"),
            (PROP_PREFIX, Self::ElementProp, "property"),
            (DATA_PREFIX, Self::ElementData, "dataset key"),
        ];
        for (prefix, build, what) in dynamic {
            if let Some(name) = raw.strip_prefix(prefix) {
                let name = name.trim();
                if name.is_empty() {
                    return Err(TrackError::malformed(raw, format!("missing {what} name")));
                }
                return Ok(build(name.to_string()));
            }
        }
        Ok(Self::Literal(raw.to_string()))
    }

    /// Parse an optional option string; absent or blank input yields `None`.
    pub fn parse_optional(raw: Option<&str>) -> TrackResult<Option<Self>> {
        match raw {
            Some(s) if !trackthat_core::types::is_blank(s) => Self::parse(s).map(Some),
            _ => Ok(None),
        }
    }

    /// Whether resolution reads the element.
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, Self::Literal(_))
    }

    /// Resolve against the current state of `element`. Missing values
    /// resolve to an empty string.
    pub fn resolve(&self, element: &dyn Element) -> String {
        match self {
            Self::Literal(s) => s.clone(),
            Self::ElementValue => element.value().unwrap_or_default(),
            Self::ElementText => element.text(),
            Self::ElementAttr(name) => element.attr(name).unwrap_or_default(),
            Self::ElementProp(name) => element.prop(name).map(prop_string).unwrap_or_default(),
            Self::ElementData(key) => element.data(key).unwrap_or_default(),
        }
    }
}

/// Resolve an optional rule; no rule resolves to an empty string.
pub fn resolve_optional(rule: Option<&OptionRule>, element: &dyn Element) -> String {
    rule.map(|r| r.resolve(element)).unwrap_or_default()
}

fn prop_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

impl FromStr for OptionRule {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OptionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => f.write_str(s),
            Self::ElementValue => f.write_str(VALUE),
            Self::ElementText => f.write_str(TEXT),
            Self::ElementAttr(name) => write!(f, "{ATTR_PREFIX}{name}"),
            Self::ElementProp(name) => write!(f, "{PROP_PREFIX}{name}"),
            Self::ElementData(key) => write!(f, "{DATA_PREFIX}{key}"),
        }
    }
}
