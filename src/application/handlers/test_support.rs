//! Mock ports shared by the handler tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::decision::{Decision, DecisionUpdate};
use crate::domain::foundation::{
    CommandMetadata, DecisionId, DomainError, ErrorCode, EventEnvelope, OrganisationId,
    StakeholderId,
};
use crate::domain::team::TeamHierarchy;
use crate::ports::{
    DecisionChange, DecisionRepository, DecisionSubscription, EventPublisher,
    TeamHierarchyRepository,
};

// ─────────────────────────────────────────────────────────────────────
// Decisions
// ─────────────────────────────────────────────────────────────────────

pub struct MockDecisionRepository {
    decisions: Mutex<Vec<Decision>>,
    batches: Mutex<Vec<Vec<Decision>>>,
    sender: broadcast::Sender<DecisionChange>,
    fail_writes: bool,
}

impl MockDecisionRepository {
    pub fn new() -> Self {
        Self::with_decisions(Vec::new())
    }

    pub fn with_decisions(decisions: Vec<Decision>) -> Self {
        let (sender, _) = broadcast::channel(16);
        Self {
            decisions: Mutex::new(decisions),
            batches: Mutex::new(Vec::new()),
            sender,
            fail_writes: false,
        }
    }

    pub fn failing(decisions: Vec<Decision>) -> Self {
        Self {
            fail_writes: true,
            ..Self::with_decisions(decisions)
        }
    }

    pub fn stored(&self, id: &DecisionId) -> Option<Decision> {
        self.decisions
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.decisions.lock().unwrap().len()
    }

    pub fn batches(&self) -> Vec<Vec<Decision>> {
        self.batches.lock().unwrap().clone()
    }

    fn check_writable(&self) -> Result<(), DomainError> {
        if self.fail_writes {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Simulated write failure",
            ));
        }
        Ok(())
    }

    /// Checks every row before writing any, like the real adapters.
    fn replace(&self, batch: &[Decision]) -> Result<(), DomainError> {
        let mut decisions = self.decisions.lock().unwrap();
        for decision in batch {
            let current = decisions
                .iter()
                .find(|d| d.id() == decision.id())
                .ok_or_else(|| DomainError::new(ErrorCode::DecisionNotFound, "missing"))?;
            if current.version() != decision.version() {
                return Err(DomainError::version_conflict(
                    "Decision",
                    decision.id(),
                    decision.version(),
                    current.version(),
                ));
            }
        }
        for decision in batch {
            if let Some(slot) = decisions.iter_mut().find(|d| d.id() == decision.id()) {
                *slot = decision.next_version();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DecisionRepository for MockDecisionRepository {
    async fn find_all(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<Decision>, DomainError> {
        Ok(self
            .decisions
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.organisation_id() == organisation_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(
        &self,
        organisation_id: &OrganisationId,
        id: &DecisionId,
    ) -> Result<Option<Decision>, DomainError> {
        Ok(self
            .stored(id)
            .filter(|d| d.organisation_id() == organisation_id))
    }

    async fn create(&self, decision: &Decision) -> Result<(), DomainError> {
        self.check_writable()?;
        self.decisions.lock().unwrap().push(decision.clone());
        Ok(())
    }

    async fn update(&self, decision: &Decision) -> Result<(), DomainError> {
        self.check_writable()?;
        self.replace(std::slice::from_ref(decision))
    }

    async fn delete(
        &self,
        _organisation_id: &OrganisationId,
        id: &DecisionId,
    ) -> Result<(), DomainError> {
        self.check_writable()?;
        self.decisions.lock().unwrap().retain(|d| d.id() != id);
        Ok(())
    }

    async fn apply_batch(
        &self,
        _organisation_id: &OrganisationId,
        decisions: &[Decision],
    ) -> Result<(), DomainError> {
        self.check_writable()?;
        self.replace(decisions)?;
        self.batches
            .lock()
            .unwrap()
            .push(decisions.iter().map(Decision::next_version).collect());
        Ok(())
    }

    fn subscribe_all(&self, organisation_id: &OrganisationId) -> DecisionSubscription {
        DecisionSubscription::new(self.sender.subscribe(), organisation_id.clone(), None)
    }

    fn subscribe(&self, organisation_id: &OrganisationId, id: &DecisionId) -> DecisionSubscription {
        DecisionSubscription::new(
            self.sender.subscribe(),
            organisation_id.clone(),
            Some(id.clone()),
        )
    }
}

// ─────────────────────────────────────────────────────────────────────
// Team hierarchies
// ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockTeamHierarchyRepository {
    hierarchies: Mutex<HashMap<OrganisationId, TeamHierarchy>>,
    fail_save: bool,
}

impl MockTeamHierarchyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_save: true,
            ..Self::default()
        }
    }

    pub fn stored(&self, organisation_id: &OrganisationId) -> Option<TeamHierarchy> {
        self.hierarchies
            .lock()
            .unwrap()
            .get(organisation_id)
            .cloned()
    }
}

#[async_trait]
impl TeamHierarchyRepository for MockTeamHierarchyRepository {
    async fn find(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<TeamHierarchy>, DomainError> {
        Ok(self.stored(organisation_id))
    }

    async fn save(
        &self,
        organisation_id: &OrganisationId,
        hierarchy: &TeamHierarchy,
    ) -> Result<(), DomainError> {
        if self.fail_save {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Simulated save failure",
            ));
        }
        self.hierarchies
            .lock()
            .unwrap()
            .insert(organisation_id.clone(), hierarchy.next_version());
        Ok(())
    }

    async fn delete(&self, organisation_id: &OrganisationId) -> Result<(), DomainError> {
        self.hierarchies.lock().unwrap().remove(organisation_id);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockEventPublisher {
    published_events: Mutex<Vec<EventEnvelope>>,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published_events(&self) -> Vec<EventEnvelope> {
        self.published_events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for MockEventPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        self.published_events.lock().unwrap().push(event);
        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────

pub fn org() -> OrganisationId {
    OrganisationId::new("org-1").unwrap()
}

pub fn driver() -> StakeholderId {
    StakeholderId::new("driver").unwrap()
}

pub fn metadata() -> CommandMetadata {
    CommandMetadata::new(driver()).with_correlation_id("test-correlation")
}

pub fn draft(title: &str) -> Decision {
    Decision::create_empty(org(), driver(), DecisionUpdate::new().title(title)).unwrap()
}

/// A decision with an option chosen, ready to publish.
pub fn decided(title: &str) -> Decision {
    Decision::create_empty(
        org(),
        driver(),
        DecisionUpdate::new().title(title).decision("Option A"),
    )
    .unwrap()
}

/// `blocker` blocks `blocked`, written on both sides.
pub fn blocking_pair(blocker: &Decision, blocked: &Decision) -> (Decision, Decision) {
    use crate::domain::relationship::RelationshipType;
    (
        blocker.set_relationship(RelationshipType::Blocks, blocked),
        blocked.set_relationship(RelationshipType::BlockedBy, blocker),
    )
}
