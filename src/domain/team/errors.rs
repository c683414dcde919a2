//! Team hierarchy errors.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, TeamId};

/// A rejected structural change to a team hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeamHierarchyError {
    #[error("Team {0} not found")]
    TeamNotFound(TeamId),

    #[error("Parent team {0} not found")]
    ParentNotFound(TeamId),

    #[error("Team {0} already exists")]
    DuplicateTeam(TeamId),

    #[error("Team {0} still has child teams")]
    HasChildren(TeamId),

    #[error("Moving team {team_id} under {new_parent_id} would create a cycle")]
    WouldCreateCycle {
        team_id: TeamId,
        new_parent_id: TeamId,
    },

    #[error("Team {0} must have a name")]
    EmptyName(TeamId),

    #[error("Inconsistent team hierarchy: {0}")]
    Inconsistent(String),

    #[error("Team {0} changes parent; use move_team instead")]
    ReparentingRequiresMove(TeamId),
}

impl TeamHierarchyError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TeamHierarchyError::EmptyName(_) => ErrorCode::ValidationFailed,
            _ => ErrorCode::HierarchyInvalid,
        }
    }
}

impl From<TeamHierarchyError> for DomainError {
    fn from(err: TeamHierarchyError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
