//! DecisionStatus enum derived from a decision's publication and relationships.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a decision.
///
/// Never stored: always derived from `publish_date` and the relationship map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    #[default]
    InProgress,
    Blocked,
    Published,
    Superseded,
}

impl DecisionStatus {
    /// Returns true if the decision can still be edited directly.
    pub fn is_editable(&self) -> bool {
        matches!(self, DecisionStatus::InProgress | DecisionStatus::Blocked)
    }

    /// Returns true if the decision has left the active workflow.
    pub fn is_final(&self) -> bool {
        matches!(self, DecisionStatus::Published | DecisionStatus::Superseded)
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecisionStatus::InProgress => "In Progress",
            DecisionStatus::Blocked => "Blocked",
            DecisionStatus::Published => "Published",
            DecisionStatus::Superseded => "Superseded",
        };
        write!(f, "{}", s)
    }
}
