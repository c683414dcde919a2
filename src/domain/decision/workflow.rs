//! Workflow steps and navigation.
//!
//! Every decision moves through five fixed steps:
//!
//! 1. Identify → 2. Stakeholders → 3. Method → 4. Choose → 5. Publish
//!
//! `WorkflowNavigator` centralizes the ordering so UI-driven navigation and
//! the decision's derived `current_step` agree on it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// One stage of the decision workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Identify,
    Stakeholders,
    Method,
    Choose,
    Publish,
}

impl WorkflowStep {
    /// Returns the step's key as used in URLs and JSON.
    pub fn key(&self) -> &'static str {
        match self {
            WorkflowStep::Identify => "identify",
            WorkflowStep::Stakeholders => "stakeholders",
            WorkflowStep::Method => "method",
            WorkflowStep::Choose => "choose",
            WorkflowStep::Publish => "publish",
        }
    }

    /// Returns the display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            WorkflowStep::Identify => "Identify",
            WorkflowStep::Stakeholders => "Stakeholders",
            WorkflowStep::Method => "Method",
            WorkflowStep::Choose => "Choose",
            WorkflowStep::Publish => "Publish",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for WorkflowStep {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowNavigator::ORDER
            .iter()
            .find(|step| step.key().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| {
                ValidationError::invalid_format("workflow_step", format!("unknown step '{}'", s))
            })
    }
}

/// Stateless navigation over the fixed workflow sequence.
pub struct WorkflowNavigator;

impl WorkflowNavigator {
    /// The canonical order of workflow steps.
    pub const ORDER: [WorkflowStep; 5] = [
        WorkflowStep::Identify,
        WorkflowStep::Stakeholders,
        WorkflowStep::Method,
        WorkflowStep::Choose,
        WorkflowStep::Publish,
    ];

    /// Returns all steps in order.
    pub fn all() -> &'static [WorkflowStep; 5] {
        &Self::ORDER
    }

    /// Returns the 0-based index of a step.
    pub fn step_index(step: WorkflowStep) -> usize {
        match step {
            WorkflowStep::Identify => 0,
            WorkflowStep::Stakeholders => 1,
            WorkflowStep::Method => 2,
            WorkflowStep::Choose => 3,
            WorkflowStep::Publish => 4,
        }
    }

    /// Returns the index of a step given by key, failing for unknown keys.
    pub fn step_index_of(key: &str) -> Result<usize, ValidationError> {
        Ok(Self::step_index(key.parse()?))
    }

    /// Returns the next step, or None after Publish.
    pub fn next_step(step: WorkflowStep) -> Option<WorkflowStep> {
        Self::ORDER.get(Self::step_index(step) + 1).copied()
    }

    /// Returns the previous step, or None before Identify.
    pub fn previous_step(step: WorkflowStep) -> Option<WorkflowStep> {
        Self::step_index(step)
            .checked_sub(1)
            .and_then(|idx| Self::ORDER.get(idx).copied())
    }

    pub fn is_first_step(step: WorkflowStep) -> bool {
        step == Self::ORDER[0]
    }

    pub fn is_last_step(step: WorkflowStep) -> bool {
        step == Self::ORDER[Self::ORDER.len() - 1]
    }

    /// Returns true if navigation from `from` to `to` moves at most one step.
    ///
    /// Staying on the same step is allowed.
    pub fn is_valid_transition(from: WorkflowStep, to: WorkflowStep) -> bool {
        Self::step_index(from).abs_diff(Self::step_index(to)) <= 1
    }
}
