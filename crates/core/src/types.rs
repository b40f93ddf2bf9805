use serde::{Deserialize, Serialize};

/// Event kind literal passed to the backend for every tracked event.
pub const TRACK_EVENT_KIND: &str = "_trackEvent";

/// True when `s` is empty or whitespace only.
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// The resolved (category, action, label) triple sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEvent {
    pub category: String,
    pub action: String,
    #[serde(default)]
    pub label: String,
}

impl TrackedEvent {
    pub fn new(
        category: impl Into<String>,
        action: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
            label: label.into(),
        }
    }

    /// Name of the first required field that is blank, if any.
    pub fn blank_field(&self) -> Option<&'static str> {
        if is_blank(&self.category) {
            Some("category")
        } else if is_blank(&self.action) {
            Some("action")
        } else {
            None
        }
    }

    /// Line shown by the debug surface: `Category | Action | Label`.
    pub fn debug_line(&self) -> String {
        format!("{} | {} | {}", self.category, self.action, self.label)
    }
}
