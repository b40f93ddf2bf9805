//! DOM collaborator traits.
//!
//! The tracker never owns a document. It reads element state through
//! [`Element`], registers listeners through [`ElementSet`], and turns
//! selector strings from definition files into element sets through
//! [`ElementQuery`]. A browser host implements these over its real DOM;
//! [`memory`] provides a small in-memory document for tests and dry runs.

pub mod memory;
pub mod selector;

use std::sync::Arc;

use trackthat_core::TrackResult;

/// Read access to a single element at event time.
pub trait Element: Send + Sync {
    /// Current form value, if the element has one.
    fn value(&self) -> Option<String>;

    /// Rendered text content including descendants.
    fn text(&self) -> String;

    /// Current value of an attribute.
    fn attr(&self, name: &str) -> Option<String>;

    /// Current value of a DOM property.
    fn prop(&self, name: &str) -> Option<serde_json::Value>;

    /// Current dataset entry, keyed the DOM way (`data-foo-bar` is `fooBar`).
    fn data(&self, key: &str) -> Option<String>;

    /// Whether this handle still refers to a live element that events can be
    /// bound to and pushed from.
    fn is_bindable(&self) -> bool {
        true
    }
}

/// Handler invoked with the element an event targeted.
pub type EventHandler = Arc<dyn Fn(&dyn Element) + Send + Sync>;

/// A set of elements that delegated listeners can be registered on.
pub trait ElementSet: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register `handler` for `event_type` on every element of the set.
    ///
    /// Without a scope the handler fires for events reaching a member of the
    /// set and receives that member. With a scope it fires for events that
    /// bubble up from descendants matching the scope selector and receives
    /// the matching descendant.
    ///
    /// A scope the set cannot interpret is an error and registers nothing.
    fn on(&self, event_type: &str, scope: Option<&str>, handler: EventHandler) -> TrackResult<()>;
}

/// Resolves selector strings into element sets.
pub trait ElementQuery {
    fn query(&self, selector: &str) -> Arc<dyn ElementSet>;
}
