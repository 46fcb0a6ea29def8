//! Story descriptors fetched from a target's component catalog.

use serde::{Deserialize, Serialize};

/// A single story (one rendered state of one component).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Catalog identifier, e.g. `button--primary`.
    pub id: String,

    /// Component grouping, e.g. `Button`.
    pub kind: String,

    /// Story name within the component, e.g. `primary`.
    pub story: String,

    /// Optional URL override for targets that navigate per story.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Free-form per-story parameters forwarded to the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

impl Story {
    /// Create a story from its catalog coordinates.
    pub fn new(id: impl Into<String>, kind: impl Into<String>, story: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            story: story.into(),
            url: None,
            parameters: None,
        }
    }

    /// Builder method to attach parameters.
    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// The `"{kind} {story}"` string that filter patterns match against.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.kind, self.story)
    }
}
