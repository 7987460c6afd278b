use serde::Deserialize;

use crate::ActionItem;

/// Optional exact-match filters. Absent or empty filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActionFilter {
    pub status: Option<String>,
    pub deadline: Option<String>,
    pub priority: Option<String>,
}

impl ActionFilter {
    pub fn is_empty(&self) -> bool {
        active(&self.status).is_none() && active(&self.deadline).is_none() && active(&self.priority).is_none()
    }

    /// Narrow `actions` by status, then deadline, then priority.
    pub fn apply(&self, actions: &[ActionItem]) -> Vec<ActionItem> {
        let mut kept: Vec<ActionItem> = actions.to_vec();

        if let Some(status) = active(&self.status) {
            kept.retain(|a| a.status == status);
        }
        if let Some(deadline) = active(&self.deadline) {
            kept.retain(|a| a.deadline.as_deref() == Some(deadline));
        }
        if let Some(priority) = active(&self.priority) {
            kept.retain(|a| a.priority.as_str() == priority);
        }

        kept
    }
}

/// `?priority=` arrives as an empty string and means "no filter".
fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
