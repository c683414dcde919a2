//! Partial field updates applied through `Decision::with`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;

use crate::domain::foundation::{ProjectId, TeamId};

use super::{Cost, DecisionMethod, Reversibility, SupportingMaterial};

/// Set of field changes for a decision. `None` leaves a field untouched.
///
/// `decision_method` and `decision` are optional on the decision itself, so
/// they take `Some(None)` to clear the value. In JSON an explicit `null`
/// clears and a missing key leaves the field alone.
///
/// Stakeholders, the driver, publication and relationships have dedicated
/// operations and are not part of an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Cost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversibility: Option<Reversibility>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub decision_method: Option<Option<DecisionMethod>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "nullable")]
    pub decision: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supporting_materials: Option<Vec<SupportingMaterial>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_ids: Option<BTreeSet<TeamId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_ids: Option<BTreeSet<ProjectId>>,
}

impl DecisionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn cost(mut self, cost: Cost) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn reversibility(mut self, reversibility: Reversibility) -> Self {
        self.reversibility = Some(reversibility);
        self
    }

    pub fn decision_method(mut self, method: DecisionMethod) -> Self {
        self.decision_method = Some(Some(method));
        self
    }

    pub fn clear_decision_method(mut self) -> Self {
        self.decision_method = Some(None);
        self
    }

    /// Records the chosen option.
    pub fn decision(mut self, decision: impl Into<String>) -> Self {
        self.decision = Some(Some(decision.into()));
        self
    }

    /// Withdraws the chosen option.
    pub fn clear_decision(mut self) -> Self {
        self.decision = Some(None);
        self
    }

    pub fn supporting_materials(mut self, materials: Vec<SupportingMaterial>) -> Self {
        self.supporting_materials = Some(materials);
        self
    }

    pub fn team_ids(mut self, team_ids: BTreeSet<TeamId>) -> Self {
        self.team_ids = Some(team_ids);
        self
    }

    pub fn project_ids(mut self, project_ids: BTreeSet<ProjectId>) -> Self {
        self.project_ids = Some(project_ids);
        self
    }

    /// Returns true if no field would change.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Keeps "absent" and "null" apart for nested options.
mod nullable {
    use super::*;

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
