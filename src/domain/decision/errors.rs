//! Decision-specific error types.

use thiserror::Error;

use crate::domain::foundation::{
    DecisionId, DomainError, ErrorCode, StakeholderId, ValidationError,
};

/// Invalid lifecycle transition on a decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionStateError {
    #[error("Decision {0} cannot be published before an option is chosen")]
    NoOptionChosen(DecisionId),

    #[error("Decision {0} is already published")]
    AlreadyPublished(DecisionId),

    #[error("Decision {0} is blocked by another decision")]
    Blocked(DecisionId),

    #[error("Decision {0} has been superseded")]
    Superseded(DecisionId),

    #[error("Decision {0} is published and can no longer be edited")]
    Immutable(DecisionId),
}

/// Invalid stakeholder operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakeholderError {
    #[error("Stakeholder {0} is already part of this decision")]
    AlreadyPresent(StakeholderId),

    #[error("Stakeholder {0} is not part of this decision")]
    NotPresent(StakeholderId),

    #[error("Stakeholder {0} drives this decision; assign another driver first")]
    CannotRemoveDriver(StakeholderId),
}

/// Any failure raised by a `Decision` operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error(transparent)]
    State(#[from] DecisionStateError),

    #[error(transparent)]
    Stakeholder(#[from] StakeholderError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Supporting material {0} is already attached")]
    DuplicateMaterial(String),

    #[error("Supporting material {0} is not attached")]
    MaterialNotFound(String),
}

impl DecisionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            DecisionError::State(_) => ErrorCode::DecisionState,
            DecisionError::Stakeholder(_) => ErrorCode::StakeholderInvalid,
            DecisionError::Validation(_)
            | DecisionError::DuplicateMaterial(_)
            | DecisionError::MaterialNotFound(_) => ErrorCode::ValidationFailed,
        }
    }
}

impl From<DecisionError> for DomainError {
    fn from(err: DecisionError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
