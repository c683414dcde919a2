//! AddRelationshipHandler - Command handler for linking two decisions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    domain_event, CommandMetadata, DecisionId, DomainError, EventId, OrganisationId,
    SerializableDomainEvent, Timestamp,
};
use crate::domain::relationship::{EdgeWrite, RelationshipError, RelationshipGraph, RelationshipType};
use crate::ports::{DecisionRepository, EventPublisher};

/// Command to add a relationship.
///
/// Either orientation is accepted: `a blocked_by b` is stored as
/// `b blocks a`.
#[derive(Debug, Clone)]
pub struct AddRelationshipCommand {
    pub organisation_id: OrganisationId,
    pub from_decision_id: DecisionId,
    pub relationship_type: RelationshipType,
    pub to_decision_id: DecisionId,
}

#[derive(Debug, Clone)]
pub struct AddRelationshipResult {
    /// Both endpoints as persisted, source first.
    pub write: EdgeWrite,
    pub event: RelationshipAddedEvent,
}

/// Event published when a relationship is added.
///
/// Always reported in forward orientation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipAddedEvent {
    pub event_id: EventId,
    pub organisation_id: OrganisationId,
    pub from_decision_id: DecisionId,
    pub relationship_type: RelationshipType,
    pub to_decision_id: DecisionId,
    pub added_at: Timestamp,
}

domain_event!(
    RelationshipAddedEvent,
    event_type = "decision.relationship_added.v1",
    aggregate_id = from_decision_id,
    aggregate_type = "Decision",
    occurred_at = added_at,
    event_id = event_id
);

/// Error type for adding relationships.
#[derive(Debug, Clone)]
pub enum AddRelationshipError {
    /// Rejected by the relationship graph.
    Relationship(RelationshipError),
    Domain(DomainError),
}

impl std::fmt::Display for AddRelationshipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddRelationshipError::Relationship(err) => write!(f, "{}", err),
            AddRelationshipError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AddRelationshipError {}

impl From<RelationshipError> for AddRelationshipError {
    fn from(err: RelationshipError) -> Self {
        AddRelationshipError::Relationship(err)
    }
}

impl From<DomainError> for AddRelationshipError {
    fn from(err: DomainError) -> Self {
        AddRelationshipError::Domain(err)
    }
}

/// Handler for adding relationships.
pub struct AddRelationshipHandler {
    decision_repository: Arc<dyn DecisionRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl AddRelationshipHandler {
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
        cmd: AddRelationshipCommand,
        metadata: CommandMetadata,
    ) -> Result<AddRelationshipResult, AddRelationshipError> {
        if cmd.from_decision_id == cmd.to_decision_id {
            return Err(RelationshipError::SelfRelationship(cmd.from_decision_id).into());
        }

        let decisions = self
            .decision_repository
            .find_all(&cmd.organisation_id)
            .await?;
        let graph = RelationshipGraph::new(cmd.organisation_id.clone(), decisions)?;

        let from = graph
            .decision(&cmd.from_decision_id)
            .ok_or_else(|| RelationshipError::DecisionNotFound(cmd.from_decision_id.clone()))?;
        let to = graph
            .decision(&cmd.to_decision_id)
            .ok_or_else(|| RelationshipError::DecisionNotFound(cmd.to_decision_id.clone()))?;

        let write = graph
            .add_relationship(from, cmd.relationship_type, to)
            .map_err(|e| {
                tracing::warn!(
                    from = %cmd.from_decision_id,
                    to = %cmd.to_decision_id,
                    relationship_type = %cmd.relationship_type,
                    error = %e,
                    "Relationship rejected"
                );
                e
            })?;

        self.decision_repository
            .apply_batch(
                &cmd.organisation_id,
                &[write.source.clone(), write.target.clone()],
            )
            .await?;
        let write = EdgeWrite {
            source: write.source.next_version(),
            target: write.target.next_version(),
        };

        let relationship_type = cmd.relationship_type.forward();
        tracing::info!(
            from = %write.source.id(),
            to = %write.target.id(),
            relationship_type = %relationship_type,
            "Relationship added"
        );

        let event = RelationshipAddedEvent {
            event_id: EventId::new(),
            organisation_id: cmd.organisation_id,
            from_decision_id: write.source.id().clone(),
            relationship_type,
            to_decision_id: write.target.id().clone(),
            added_at: Timestamp::now(),
        };

        let envelope = event
            .to_envelope()?
            .with_correlation_id(metadata.correlation_id())
            .with_user_id(metadata.actor_id.to_string());

        self.event_publisher.publish(envelope).await?;

        Ok(AddRelationshipResult { write, event })
    }
}
