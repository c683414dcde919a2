//! UpdateDecisionHandler - Command handler for editing an unpublished decision.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::decision::{
    Decision, DecisionError, DecisionStatus, DecisionUpdate, StakeholderRole, SupportingMaterial,
    WorkflowStep,
};
use crate::domain::foundation::{
    domain_event, CommandMetadata, DecisionId, DomainError, EventId, OrganisationId,
    SerializableDomainEvent, StakeholderId, Timestamp,
};
use crate::ports::{DecisionRepository, EventPublisher};

/// One edit to a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionEdit {
    /// Merge the set fields.
    Fields(DecisionUpdate),
    AddStakeholder {
        stakeholder_id: StakeholderId,
        role: StakeholderRole,
    },
    RemoveStakeholder(StakeholderId),
    SetStakeholderRole {
        stakeholder_id: StakeholderId,
        role: StakeholderRole,
    },
    /// Hand the driver role to another stakeholder.
    SetDriver(StakeholderId),
    AddSupportingMaterial(SupportingMaterial),
    RemoveSupportingMaterial {
        url: String,
    },
}

impl DecisionEdit {
    /// Name recorded in `DecisionUpdatedEvent::edit`.
    pub fn kind(&self) -> &'static str {
        match self {
            DecisionEdit::Fields(_) => "fields",
            DecisionEdit::AddStakeholder { .. } => "add_stakeholder",
            DecisionEdit::RemoveStakeholder(_) => "remove_stakeholder",
            DecisionEdit::SetStakeholderRole { .. } => "set_stakeholder_role",
            DecisionEdit::SetDriver(_) => "set_driver",
            DecisionEdit::AddSupportingMaterial(_) => "add_supporting_material",
            DecisionEdit::RemoveSupportingMaterial { .. } => "remove_supporting_material",
        }
    }

    fn apply(self, decision: &Decision) -> Result<Decision, DecisionError> {
        match self {
            DecisionEdit::Fields(update) => decision.with(update),
            DecisionEdit::AddStakeholder {
                stakeholder_id,
                role,
            } => decision.add_stakeholder(stakeholder_id, role),
            DecisionEdit::RemoveStakeholder(stakeholder_id) => {
                decision.remove_stakeholder(&stakeholder_id)
            }
            DecisionEdit::SetStakeholderRole {
                stakeholder_id,
                role,
            } => decision.set_stakeholder_role(&stakeholder_id, role),
            DecisionEdit::SetDriver(stakeholder_id) => decision.set_decision_driver(stakeholder_id),
            DecisionEdit::AddSupportingMaterial(material) => {
                decision.add_supporting_material(material)
            }
            DecisionEdit::RemoveSupportingMaterial { url } => {
                decision.remove_supporting_material(&url)
            }
        }
    }
}

/// Command to edit a decision.
#[derive(Debug, Clone)]
pub struct UpdateDecisionCommand {
    pub organisation_id: OrganisationId,
    pub decision_id: DecisionId,
    pub edit: DecisionEdit,
}

/// Result of a successful edit.
#[derive(Debug, Clone)]
pub struct UpdateDecisionResult {
    pub decision: Decision,
    pub event: DecisionUpdatedEvent,
}

/// Event published when a decision is edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionUpdatedEvent {
    pub event_id: EventId,
    pub decision_id: DecisionId,
    pub organisation_id: OrganisationId,
    /// Which kind of edit was applied.
    pub edit: String,
    /// Workflow step after the edit.
    pub current_step: WorkflowStep,
    pub status: DecisionStatus,
    pub updated_at: Timestamp,
}

domain_event!(
    DecisionUpdatedEvent,
    event_type = "decision.updated.v1",
    aggregate_id = decision_id,
    aggregate_type = "Decision",
    occurred_at = updated_at,
    event_id = event_id
);

/// Error type for decision edits.
#[derive(Debug, Clone)]
pub enum UpdateDecisionError {
    NotFound(DecisionId),
    /// A field update with nothing set.
    EmptyUpdate,
    /// Rejected by the decision itself.
    Decision(DecisionError),
    Domain(DomainError),
}

impl std::fmt::Display for UpdateDecisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateDecisionError::NotFound(id) => write!(f, "Decision not found: {}", id),
            UpdateDecisionError::EmptyUpdate => write!(f, "Update sets no fields"),
            UpdateDecisionError::Decision(err) => write!(f, "{}", err),
            UpdateDecisionError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for UpdateDecisionError {}

impl From<DecisionError> for UpdateDecisionError {
    fn from(err: DecisionError) -> Self {
        UpdateDecisionError::Decision(err)
    }
}

impl From<DomainError> for UpdateDecisionError {
    fn from(err: DomainError) -> Self {
        UpdateDecisionError::Domain(err)
    }
}

/// Handler for editing decisions.
pub struct UpdateDecisionHandler {
    decision_repository: Arc<dyn DecisionRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl UpdateDecisionHandler {
    pub fn new(
        decision_repository: Arc<dyn DecisionRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            decision_repository,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: UpdateDecisionCommand,
        metadata: CommandMetadata,
    ) -> Result<UpdateDecisionResult, UpdateDecisionError> {
        if matches!(&cmd.edit, DecisionEdit::Fields(update) if update.is_empty()) {
            return Err(UpdateDecisionError::EmptyUpdate);
        }

        let current = self
            .decision_repository
            .find_by_id(&cmd.organisation_id, &cmd.decision_id)
            .await?
            .ok_or_else(|| UpdateDecisionError::NotFound(cmd.decision_id.clone()))?;

        let kind = cmd.edit.kind();
        let decision = cmd.edit.apply(&current).map_err(|e| {
            tracing::warn!(decision_id = %current.id(), edit = kind, error = %e, "Rejected decision edit");
            e
        })?;

        self.decision_repository.update(&decision).await?;
        let decision = decision.next_version();
        tracing::info!(
            decision_id = %decision.id(),
            edit = kind,
            step = %decision.current_step(),
            "Decision updated"
        );

        let event = DecisionUpdatedEvent {
            event_id: EventId::new(),
            decision_id: decision.id().clone(),
            organisation_id: decision.organisation_id().clone(),
            edit: kind.to_string(),
            current_step: decision.current_step(),
            status: decision.status(),
            updated_at: decision.updated_at(),
        };

        let envelope = event
            .to_envelope()?
            .with_correlation_id(metadata.correlation_id())
            .with_user_id(metadata.actor_id.to_string());

        self.event_publisher.publish(envelope).await?;

        Ok(UpdateDecisionResult { decision, event })
    }
}
