//! Relationship graph errors.

use thiserror::Error;

use crate::domain::foundation::{DecisionId, DomainError, ErrorCode, OrganisationId};

use super::RelationshipType;

/// A rejected change to the relationship graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelationshipError {
    #[error("Decision {0} cannot be related to itself")]
    SelfRelationship(DecisionId),

    #[error("Decision {decision_id} does not belong to organisation {organisation_id}")]
    CrossOrganisation {
        decision_id: DecisionId,
        organisation_id: OrganisationId,
    },

    #[error("Adding {relationship_type} from {from} to {to} would create a cycle")]
    CycleDetected {
        relationship_type: RelationshipType,
        from: DecisionId,
        to: DecisionId,
    },

    #[error("Decision {decision_id} already supersedes {existing_target}")]
    DuplicateSupersession {
        decision_id: DecisionId,
        existing_target: DecisionId,
    },

    #[error("Decision {0} not found")]
    DecisionNotFound(DecisionId),

    #[error("Relationship {0} not found")]
    RelationshipNotFound(String),

    #[error("Relationship type {0} is only recorded by publication")]
    HistoricalType(RelationshipType),

    #[error("Decision {0} is not published")]
    NotPublished(DecisionId),

    #[error("Decision {0} is already published and can no longer block others")]
    BlockerPublished(DecisionId),
}

impl RelationshipError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RelationshipError::CycleDetected { .. } => ErrorCode::RelationshipCycle,
            RelationshipError::DecisionNotFound(_) => ErrorCode::DecisionNotFound,
            RelationshipError::NotPublished(_) => ErrorCode::DecisionState,
            RelationshipError::SelfRelationship(_)
            | RelationshipError::CrossOrganisation { .. }
            | RelationshipError::DuplicateSupersession { .. }
            | RelationshipError::RelationshipNotFound(_)
            | RelationshipError::HistoricalType(_)
            | RelationshipError::BlockerPublished(_) => ErrorCode::RelationshipInvalid,
        }
    }
}

impl From<RelationshipError> for DomainError {
    fn from(err: RelationshipError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
