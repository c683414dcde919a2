//! Typed directed edges between decisions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::decision::Decision;
use crate::domain::foundation::{
    DecisionId, OrganisationId, ProjectId, TeamId, Timestamp, ValidationError,
};

/// Kind of relationship, seen from the decision that holds it.
///
/// Each type has an inverse stored on the other endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    BlockedBy,
    Blocks,
    Supersedes,
    SupersededBy,
    /// Former `blocks`, kept after the blocking decision was published.
    DidBlock,
    /// Former `blocked_by`, kept after the blocking decision was published.
    WasBlockedBy,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 6] = [
        RelationshipType::BlockedBy,
        RelationshipType::Blocks,
        RelationshipType::Supersedes,
        RelationshipType::SupersededBy,
        RelationshipType::DidBlock,
        RelationshipType::WasBlockedBy,
    ];

    /// Returns the type recorded on the other endpoint.
    pub fn inverse(&self) -> RelationshipType {
        match self {
            RelationshipType::BlockedBy => RelationshipType::Blocks,
            RelationshipType::Blocks => RelationshipType::BlockedBy,
            RelationshipType::Supersedes => RelationshipType::SupersededBy,
            RelationshipType::SupersededBy => RelationshipType::Supersedes,
            RelationshipType::DidBlock => RelationshipType::WasBlockedBy,
            RelationshipType::WasBlockedBy => RelationshipType::DidBlock,
        }
    }

    /// Returns true for the source-side type of each pair.
    pub fn is_forward(&self) -> bool {
        matches!(
            self,
            RelationshipType::Blocks | RelationshipType::Supersedes | RelationshipType::DidBlock
        )
    }

    /// Returns true for types that only record history.
    pub fn is_historical(&self) -> bool {
        matches!(self, RelationshipType::DidBlock | RelationshipType::WasBlockedBy)
    }

    /// Returns the forward type of this type's pair.
    pub fn forward(&self) -> RelationshipType {
        if self.is_forward() {
            *self
        } else {
            self.inverse()
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::BlockedBy => "blocked_by",
            RelationshipType::Blocks => "blocks",
            RelationshipType::Supersedes => "supersedes",
            RelationshipType::SupersededBy => "superseded_by",
            RelationshipType::DidBlock => "did_block",
            RelationshipType::WasBlockedBy => "was_blocked_by",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "relationship_type",
                    format!("unknown relationship type '{}'", s),
                )
            })
    }
}

/// Key of an entry in a decision's relationship map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationshipKey {
    pub relationship_type: RelationshipType,
    pub target_decision_id: DecisionId,
}

impl RelationshipKey {
    pub fn new(relationship_type: RelationshipType, target_decision_id: DecisionId) -> Self {
        Self {
            relationship_type,
            target_decision_id,
        }
    }
}

/// Directed typed edge from one decision to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRelationship {
    relationship_type: RelationshipType,
    from_decision_id: DecisionId,
    to_decision_id: DecisionId,
    #[serde(default)]
    from_team_id: Option<TeamId>,
    #[serde(default)]
    from_project_id: Option<ProjectId>,
    #[serde(default)]
    to_team_id: Option<TeamId>,
    #[serde(default)]
    to_project_id: Option<ProjectId>,
    organisation_id: OrganisationId,
    created_at: Timestamp,
}

impl DecisionRelationship {
    /// Builds an edge between two decisions, taking team and project
    /// context from each endpoint's first association.
    pub fn between(
        from: &Decision,
        relationship_type: RelationshipType,
        to: &Decision,
        created_at: Timestamp,
    ) -> Self {
        Self {
            relationship_type,
            from_decision_id: from.id().clone(),
            to_decision_id: to.id().clone(),
            from_team_id: from.team_ids().iter().next().cloned(),
            from_project_id: from.project_ids().iter().next().cloned(),
            to_team_id: to.team_ids().iter().next().cloned(),
            to_project_id: to.project_ids().iter().next().cloned(),
            organisation_id: from.organisation_id().clone(),
            created_at,
        }
    }

    /// Deterministic composite id; the same edge always gets the same id.
    pub fn id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.from_decision_id, self.relationship_type, self.to_decision_id
        )
    }

    pub fn relationship_type(&self) -> RelationshipType {
        self.relationship_type
    }

    pub fn from_decision_id(&self) -> &DecisionId {
        &self.from_decision_id
    }

    pub fn to_decision_id(&self) -> &DecisionId {
        &self.to_decision_id
    }

    pub fn from_team_id(&self) -> Option<&TeamId> {
        self.from_team_id.as_ref()
    }

    pub fn from_project_id(&self) -> Option<&ProjectId> {
        self.from_project_id.as_ref()
    }

    pub fn to_team_id(&self) -> Option<&TeamId> {
        self.to_team_id.as_ref()
    }

    pub fn to_project_id(&self) -> Option<&ProjectId> {
        self.to_project_id.as_ref()
    }

    pub fn organisation_id(&self) -> &OrganisationId {
        &self.organisation_id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Key under which the holding decision stores this edge.
    pub fn key(&self) -> RelationshipKey {
        RelationshipKey::new(self.relationship_type, self.to_decision_id.clone())
    }

    /// The same edge as recorded on the other endpoint.
    pub fn inverse(&self) -> Self {
        Self {
            relationship_type: self.relationship_type.inverse(),
            from_decision_id: self.to_decision_id.clone(),
            to_decision_id: self.from_decision_id.clone(),
            from_team_id: self.to_team_id.clone(),
            from_project_id: self.to_project_id.clone(),
            to_team_id: self.from_team_id.clone(),
            to_project_id: self.from_project_id.clone(),
            organisation_id: self.organisation_id.clone(),
            created_at: self.created_at,
        }
    }

    /// The same endpoints with a different type.
    pub fn with_type(&self, relationship_type: RelationshipType) -> Self {
        Self {
            relationship_type,
            ..self.clone()
        }
    }

    /// Returns the edge oriented along its forward type.
    pub fn to_forward(&self) -> Self {
        if self.relationship_type.is_forward() {
            self.clone()
        } else {
            self.inverse()
        }
    }

    /// Returns true if either endpoint is associated with the team.
    pub fn touches_team(&self, team_id: &TeamId) -> bool {
        self.from_team_id.as_ref() == Some(team_id) || self.to_team_id.as_ref() == Some(team_id)
    }

    /// Returns true if either endpoint is associated with the project.
    pub fn touches_project(&self, project_id: &ProjectId) -> bool {
        self.from_project_id.as_ref() == Some(project_id)
            || self.to_project_id.as_ref() == Some(project_id)
    }
}
