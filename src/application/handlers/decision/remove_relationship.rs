//! RemoveRelationshipHandler - Command handler for unlinking two decisions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    domain_event, CommandMetadata, DecisionId, DomainError, EventId, OrganisationId,
    SerializableDomainEvent, Timestamp,
};
use crate::domain::decision::Decision;
use crate::domain::relationship::{RelationshipError, RelationshipGraph, RelationshipType};
use crate::ports::{DecisionRepository, EventPublisher};

/// Command to remove a relationship, in either orientation.
#[derive(Debug, Clone)]
pub struct RemoveRelationshipCommand {
    pub organisation_id: OrganisationId,
    pub from_decision_id: DecisionId,
    pub relationship_type: RelationshipType,
    pub to_decision_id: DecisionId,
}

#[derive(Debug, Clone)]
pub struct RemoveRelationshipResult {
    /// Endpoints as persisted, source first. A deleted endpoint is absent.
    pub decisions: Vec<Decision>,
    pub event: RelationshipRemovedEvent,
}

/// Event published when a relationship is removed, in forward orientation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipRemovedEvent {
    pub event_id: EventId,
    pub organisation_id: OrganisationId,
    pub from_decision_id: DecisionId,
    pub relationship_type: RelationshipType,
    pub to_decision_id: DecisionId,
    pub removed_at: Timestamp,
}

domain_event!(
    RelationshipRemovedEvent,
    event_type = "decision.relationship_removed.v1",
    aggregate_id = from_decision_id,
    aggregate_type = "Decision",
    occurred_at = removed_at,
    event_id = event_id
);

/// Error type for removing relationships.
#[derive(Debug, Clone)]
pub enum RemoveRelationshipError {
    Relationship(RelationshipError),
    Domain(DomainError),
}

impl std::fmt::Display for RemoveRelationshipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoveRelationshipError::Relationship(err) => write!(f, "{}", err),
            RemoveRelationshipError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RemoveRelationshipError {}

impl From<RelationshipError> for RemoveRelationshipError {
    fn from(err: RelationshipError) -> Self {
        RemoveRelationshipError::Relationship(err)
    }
}

impl From<DomainError> for RemoveRelationshipError {
    fn from(err: DomainError) -> Self {
        RemoveRelationshipError::Domain(err)
    }
}

/// Handler for removing relationships.
pub struct RemoveRelationshipHandler {
    decision_repository: Arc<dyn DecisionRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl RemoveRelationshipHandler {
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
        cmd: RemoveRelationshipCommand,
        metadata: CommandMetadata,
    ) -> Result<RemoveRelationshipResult, RemoveRelationshipError> {
        let decisions = self
            .decision_repository
            .find_all(&cmd.organisation_id)
            .await?;
        let graph = RelationshipGraph::new(cmd.organisation_id.clone(), decisions)?;

        let removal = graph.remove_relationship(
            &cmd.from_decision_id,
            cmd.relationship_type,
            &cmd.to_decision_id,
        )?;

        self.decision_repository
            .apply_batch(&cmd.organisation_id, &removal.decisions)
            .await?;

        let relationship_type = cmd.relationship_type.forward();
        tracing::info!(
            from = %removal.source_id,
            to = %removal.target_id,
            relationship_type = %relationship_type,
            rewritten = removal.decisions.len(),
            "Relationship removed"
        );

        let event = RelationshipRemovedEvent {
            event_id: EventId::new(),
            organisation_id: cmd.organisation_id,
            from_decision_id: removal.source_id,
            relationship_type,
            to_decision_id: removal.target_id,
            removed_at: Timestamp::now(),
        };

        let envelope = event
            .to_envelope()?
            .with_correlation_id(metadata.correlation_id())
            .with_user_id(metadata.actor_id.to_string());

        self.event_publisher.publish(envelope).await?;

        let decisions = removal
            .decisions
            .iter()
            .map(Decision::next_version)
            .collect();

        Ok(RemoveRelationshipResult { decisions, event })
    }
}
