//! ChangeTeamHierarchyHandler - Command handler for structural team changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    domain_event, CommandMetadata, DomainError, EventId, OrganisationId, SerializableDomainEvent,
    TeamId, Timestamp,
};
use crate::domain::team::{TeamHierarchy, TeamHierarchyError, TeamInput};
use crate::ports::{EventPublisher, TeamHierarchyRepository};

/// One structural change to a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamHierarchyChange {
    AddTeam(TeamInput),
    /// Rename; the parent must stay the same.
    UpdateTeam(TeamInput),
    MoveTeam {
        team_id: TeamId,
        new_parent_id: Option<TeamId>,
    },
    RemoveTeam(TeamId),
}

impl TeamHierarchyChange {
    pub fn kind(&self) -> &'static str {
        match self {
            TeamHierarchyChange::AddTeam(_) => "add_team",
            TeamHierarchyChange::UpdateTeam(_) => "update_team",
            TeamHierarchyChange::MoveTeam { .. } => "move_team",
            TeamHierarchyChange::RemoveTeam(_) => "remove_team",
        }
    }

    pub fn team_id(&self) -> &TeamId {
        match self {
            TeamHierarchyChange::AddTeam(input) | TeamHierarchyChange::UpdateTeam(input) => {
                &input.id
            }
            TeamHierarchyChange::MoveTeam { team_id, .. } => team_id,
            TeamHierarchyChange::RemoveTeam(team_id) => team_id,
        }
    }

    fn apply(self, hierarchy: &TeamHierarchy) -> Result<TeamHierarchy, TeamHierarchyError> {
        match self {
            TeamHierarchyChange::AddTeam(input) => hierarchy.add_team(input),
            TeamHierarchyChange::UpdateTeam(input) => hierarchy.update_team(input),
            TeamHierarchyChange::MoveTeam {
                team_id,
                new_parent_id,
            } => hierarchy.move_team(&team_id, new_parent_id.as_ref()),
            TeamHierarchyChange::RemoveTeam(team_id) => hierarchy.remove_team(&team_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangeTeamHierarchyCommand {
    pub organisation_id: OrganisationId,
    pub change: TeamHierarchyChange,
}

#[derive(Debug, Clone)]
pub struct ChangeTeamHierarchyResult {
    pub hierarchy: TeamHierarchy,
    pub event: TeamHierarchyChangedEvent,
}

/// Event published after a hierarchy change is saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamHierarchyChangedEvent {
    pub event_id: EventId,
    pub organisation_id: OrganisationId,
    pub change: String,
    pub team_id: TeamId,
    pub team_count: usize,
    pub changed_at: Timestamp,
}

domain_event!(
    TeamHierarchyChangedEvent,
    event_type = "team_hierarchy.changed.v1",
    aggregate_id = organisation_id,
    aggregate_type = "TeamHierarchy",
    occurred_at = changed_at,
    event_id = event_id
);

#[derive(Debug, Clone)]
pub enum ChangeTeamHierarchyError {
    Hierarchy(TeamHierarchyError),
    Domain(DomainError),
}

impl std::fmt::Display for ChangeTeamHierarchyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeTeamHierarchyError::Hierarchy(err) => write!(f, "{}", err),
            ChangeTeamHierarchyError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ChangeTeamHierarchyError {}

impl From<TeamHierarchyError> for ChangeTeamHierarchyError {
    fn from(err: TeamHierarchyError) -> Self {
        ChangeTeamHierarchyError::Hierarchy(err)
    }
}

impl From<DomainError> for ChangeTeamHierarchyError {
    fn from(err: DomainError) -> Self {
        ChangeTeamHierarchyError::Domain(err)
    }
}

/// Applies a change to the organisation's hierarchy and saves the whole
/// tree. An organisation without a stored hierarchy starts from an empty
/// one.
pub struct ChangeTeamHierarchyHandler {
    hierarchy_repository: Arc<dyn TeamHierarchyRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl ChangeTeamHierarchyHandler {
    pub fn new(
        hierarchy_repository: Arc<dyn TeamHierarchyRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            hierarchy_repository,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: ChangeTeamHierarchyCommand,
        metadata: CommandMetadata,
    ) -> Result<ChangeTeamHierarchyResult, ChangeTeamHierarchyError> {
        let current = self
            .hierarchy_repository
            .find(&cmd.organisation_id)
            .await?
            .unwrap_or_default();

        let kind = cmd.change.kind();
        let team_id = cmd.change.team_id().clone();
        let hierarchy = cmd.change.apply(&current).map_err(|e| {
            tracing::warn!(
                organisation_id = %cmd.organisation_id,
                team_id = %team_id,
                change = kind,
                error = %e,
                "Team hierarchy change rejected"
            );
            e
        })?;

        self.hierarchy_repository
            .save(&cmd.organisation_id, &hierarchy)
            .await?;
        let hierarchy = hierarchy.next_version();
        tracing::info!(
            organisation_id = %cmd.organisation_id,
            team_id = %team_id,
            change = kind,
            teams = hierarchy.len(),
            "Team hierarchy changed"
        );

        let event = TeamHierarchyChangedEvent {
            event_id: EventId::new(),
            organisation_id: cmd.organisation_id,
            change: kind.to_string(),
            team_id,
            team_count: hierarchy.len(),
            changed_at: Timestamp::now(),
        };

        let envelope = event
            .to_envelope()?
            .with_correlation_id(metadata.correlation_id())
            .with_user_id(metadata.actor_id.to_string());

        self.event_publisher.publish(envelope).await?;

        Ok(ChangeTeamHierarchyResult { hierarchy, event })
    }
}
