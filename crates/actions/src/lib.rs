//! Suggested next steps derived from a document's type and metadata.
//!
//! Actions are never stored: every query recomputes them from the
//! persisted classification and metadata.

pub mod filter;
pub mod rules;

pub use filter::ActionFilter;
pub use rules::derive_actions;

use serde::{Deserialize, Serialize};

/// Status every freshly derived action starts in.
pub const DEFAULT_STATUS: &str = "pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Payment,
    Review,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub deadline: Option<String>,
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

impl ActionItem {
    pub fn new(action_type: ActionType, description: impl Into<String>) -> Self {
        Self {
            action_type,
            description: description.into(),
            priority: Priority::default(),
            status: default_status(),
            deadline: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionList {
    pub document_id: String,
    pub actions: Vec<ActionItem>,
}
