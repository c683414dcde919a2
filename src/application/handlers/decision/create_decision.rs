//! CreateDecisionHandler - Command handler for starting new decisions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::decision::{Decision, DecisionError, DecisionUpdate};
use crate::domain::foundation::{
    domain_event, CommandMetadata, DecisionId, DomainError, EventId, OrganisationId,
    SerializableDomainEvent, StakeholderId, Timestamp,
};
use crate::ports::{DecisionRepository, EventPublisher};

/// Command to start a new decision.
#[derive(Debug, Clone)]
pub struct CreateDecisionCommand {
    pub organisation_id: OrganisationId,
    /// Defaults to the acting stakeholder.
    pub driver_stakeholder_id: Option<StakeholderId>,
    /// Fields set on top of the workflow defaults.
    pub initial: DecisionUpdate,
}

/// Result of successful decision creation.
#[derive(Debug, Clone)]
pub struct CreateDecisionResult {
    pub decision: Decision,
    pub event: DecisionCreatedEvent,
}

/// Event published when a decision is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionCreatedEvent {
    pub event_id: EventId,
    pub decision_id: DecisionId,
    pub organisation_id: OrganisationId,
    pub driver_stakeholder_id: StakeholderId,
    pub title: String,
    pub created_at: Timestamp,
}

domain_event!(
    DecisionCreatedEvent,
    event_type = "decision.created.v1",
    aggregate_id = decision_id,
    aggregate_type = "Decision",
    occurred_at = created_at,
    event_id = event_id
);

/// Error type for decision creation.
#[derive(Debug, Clone)]
pub enum CreateDecisionError {
    /// The initial fields were rejected.
    Decision(DecisionError),
    Domain(DomainError),
}

impl std::fmt::Display for CreateDecisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateDecisionError::Decision(err) => write!(f, "Invalid decision: {}", err),
            CreateDecisionError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CreateDecisionError {}

impl From<DecisionError> for CreateDecisionError {
    fn from(err: DecisionError) -> Self {
        CreateDecisionError::Decision(err)
    }
}

impl From<DomainError> for CreateDecisionError {
    fn from(err: DomainError) -> Self {
        CreateDecisionError::Domain(err)
    }
}

/// Handler for creating decisions.
pub struct CreateDecisionHandler {
    decision_repository: Arc<dyn DecisionRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl CreateDecisionHandler {
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
        cmd: CreateDecisionCommand,
        metadata: CommandMetadata,
    ) -> Result<CreateDecisionResult, CreateDecisionError> {
        let driver = cmd
            .driver_stakeholder_id
            .unwrap_or_else(|| metadata.actor_id.clone());

        let decision =
            Decision::create_empty(cmd.organisation_id, driver, cmd.initial).map_err(|e| {
                tracing::warn!(error = %e, "Rejected new decision");
                e
            })?;

        self.decision_repository.create(&decision).await?;
        tracing::info!(
            decision_id = %decision.id(),
            organisation_id = %decision.organisation_id(),
            "Decision created"
        );

        let event = DecisionCreatedEvent {
            event_id: EventId::new(),
            decision_id: decision.id().clone(),
            organisation_id: decision.organisation_id().clone(),
            driver_stakeholder_id: decision.driver_stakeholder_id().clone(),
            title: decision.title().to_string(),
            created_at: decision.created_at(),
        };

        let envelope = event
            .to_envelope()?
            .with_correlation_id(metadata.correlation_id())
            .with_user_id(metadata.actor_id.to_string());

        self.event_publisher.publish(envelope).await?;

        Ok(CreateDecisionResult { decision, event })
    }
}
