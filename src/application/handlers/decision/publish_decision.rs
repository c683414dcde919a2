//! PublishDecisionHandler - Command handler for publishing decisions.
//!
//! Publishing turns every `blocks` edge of the decision into `did_block`
//! history, which unblocks the targets. The decision and all rewritten
//! targets are written in one batch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::decision::{Decision, DecisionError};
use crate::domain::foundation::{
    domain_event, CommandMetadata, DecisionId, DomainError, EventId, OrganisationId,
    SerializableDomainEvent, Timestamp,
};
use crate::domain::relationship::{RelationshipError, RelationshipGraph};
use crate::ports::{DecisionRepository, EventPublisher};

/// Command to publish a decision.
#[derive(Debug, Clone)]
pub struct PublishDecisionCommand {
    pub organisation_id: OrganisationId,
    pub decision_id: DecisionId,
}

/// Result of a successful publication.
#[derive(Debug, Clone)]
pub struct PublishDecisionResult {
    pub decision: Decision,
    /// Decisions whose `blocked_by` edge to this one became history.
    pub released: Vec<Decision>,
    pub event: DecisionPublishedEvent,
}

/// Event published when a decision is published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionPublishedEvent {
    pub event_id: EventId,
    pub decision_id: DecisionId,
    pub organisation_id: OrganisationId,
    /// The chosen option.
    pub decision: Option<String>,
    /// Released decisions with no remaining blocker.
    pub unblocked_decision_ids: Vec<DecisionId>,
    pub published_at: Timestamp,
}

domain_event!(
    DecisionPublishedEvent,
    event_type = "decision.published.v1",
    aggregate_id = decision_id,
    aggregate_type = "Decision",
    occurred_at = published_at,
    event_id = event_id
);

/// Error type for publication.
#[derive(Debug, Clone)]
pub enum PublishDecisionError {
    NotFound(DecisionId),
    /// Not publishable in its current state.
    Decision(DecisionError),
    Relationship(RelationshipError),
    Domain(DomainError),
}

impl std::fmt::Display for PublishDecisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishDecisionError::NotFound(id) => write!(f, "Decision not found: {}", id),
            PublishDecisionError::Decision(err) => write!(f, "{}", err),
            PublishDecisionError::Relationship(err) => write!(f, "{}", err),
            PublishDecisionError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PublishDecisionError {}

impl From<DecisionError> for PublishDecisionError {
    fn from(err: DecisionError) -> Self {
        PublishDecisionError::Decision(err)
    }
}

impl From<RelationshipError> for PublishDecisionError {
    fn from(err: RelationshipError) -> Self {
        PublishDecisionError::Relationship(err)
    }
}

impl From<DomainError> for PublishDecisionError {
    fn from(err: DomainError) -> Self {
        PublishDecisionError::Domain(err)
    }
}

/// Handler for publishing decisions.
pub struct PublishDecisionHandler {
    decision_repository: Arc<dyn DecisionRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl PublishDecisionHandler {
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
        cmd: PublishDecisionCommand,
        metadata: CommandMetadata,
    ) -> Result<PublishDecisionResult, PublishDecisionError> {
        let decisions = self
            .decision_repository
            .find_all(&cmd.organisation_id)
            .await?;
        let graph = RelationshipGraph::new(cmd.organisation_id.clone(), decisions)?;

        let current = graph
            .decision(&cmd.decision_id)
            .ok_or_else(|| PublishDecisionError::NotFound(cmd.decision_id.clone()))?;

        let published = current.publish().map_err(|e| {
            tracing::warn!(decision_id = %cmd.decision_id, error = %e, "Publication rejected");
            e
        })?;

        let batch = graph.record_publication(&published)?;
        self.decision_repository
            .apply_batch(&cmd.organisation_id, &batch)
            .await?;

        let mut committed = batch.iter().map(Decision::next_version);
        let decision = committed
            .next()
            .unwrap_or_else(|| published.next_version());
        let released: Vec<Decision> = committed.collect();
        let unblocked_decision_ids: Vec<DecisionId> = released
            .iter()
            .filter(|d| !d.is_blocked())
            .map(|d| d.id().clone())
            .collect();

        tracing::info!(
            decision_id = %decision.id(),
            released = released.len(),
            unblocked = unblocked_decision_ids.len(),
            "Decision published"
        );

        let event = DecisionPublishedEvent {
            event_id: EventId::new(),
            decision_id: decision.id().clone(),
            organisation_id: decision.organisation_id().clone(),
            decision: decision.decision().map(str::to_string),
            unblocked_decision_ids,
            published_at: decision.publish_date().unwrap_or_else(Timestamp::now),
        };

        let envelope = event
            .to_envelope()?
            .with_correlation_id(metadata.correlation_id())
            .with_user_id(metadata.actor_id.to_string());

        self.event_publisher.publish(envelope).await?;

        Ok(PublishDecisionResult {
            decision,
            released,
            event,
        })
    }
}
