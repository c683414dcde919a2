//! Decision repository port.
//!
//! Defines the contract for persisting decisions and watching them change.
//! Every call is scoped by organisation.
//!
//! # Design
//!
//! - **Document store**: a decision is saved and loaded as a whole
//! - **Batch writes**: edge changes and publication touch several decisions
//!   and must go through `apply_batch` so they land together
//! - **Push notifications**: committed writes are announced to subscribers

use async_trait::async_trait;
use futures::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::domain::decision::Decision;
use crate::domain::foundation::{DecisionId, DomainError, OrganisationId};

/// A committed change to one decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionChange {
    /// Created or updated; carries the stored value.
    Upserted(Decision),
    Deleted {
        organisation_id: OrganisationId,
        decision_id: DecisionId,
    },
}

impl DecisionChange {
    pub fn organisation_id(&self) -> &OrganisationId {
        match self {
            DecisionChange::Upserted(decision) => decision.organisation_id(),
            DecisionChange::Deleted {
                organisation_id, ..
            } => organisation_id,
        }
    }

    pub fn decision_id(&self) -> &DecisionId {
        match self {
            DecisionChange::Upserted(decision) => decision.id(),
            DecisionChange::Deleted { decision_id, .. } => decision_id,
        }
    }
}

/// Live feed of decision changes for one organisation, or one decision.
///
/// Subscribers that fall behind skip the missed changes and keep going;
/// reload with `find_all` if a complete view is needed.
pub struct DecisionSubscription {
    receiver: broadcast::Receiver<DecisionChange>,
    organisation_id: OrganisationId,
    decision_id: Option<DecisionId>,
}

impl DecisionSubscription {
    pub fn new(
        receiver: broadcast::Receiver<DecisionChange>,
        organisation_id: OrganisationId,
        decision_id: Option<DecisionId>,
    ) -> Self {
        Self {
            receiver,
            organisation_id,
            decision_id,
        }
    }

    /// Waits for the next matching change. Returns `None` once the
    /// repository is dropped.
    pub async fn next(&mut self) -> Option<DecisionChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if self.matches(&change) => return Some(change),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        organisation_id = %self.organisation_id,
                        skipped,
                        "Decision subscriber lagged, changes skipped"
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Converts the subscription into a `Stream`.
    pub fn into_stream(self) -> impl Stream<Item = DecisionChange> + Send {
        stream::unfold(self, |mut subscription| async move {
            subscription
                .next()
                .await
                .map(|change| (change, subscription))
        })
    }

    fn matches(&self, change: &DecisionChange) -> bool {
        change.organisation_id() == &self.organisation_id
            && self
                .decision_id
                .as_ref()
                .map_or(true, |id| change.decision_id() == id)
    }
}

/// Repository port for decisions.
///
/// Implementations must ensure:
/// - `apply_batch` writes all decisions or none
/// - a replacement is accepted only if the stored version still equals
///   the version the value was loaded at; the stored copy is then one
///   version higher
/// - subscribers are notified only after a write is committed
#[async_trait]
pub trait DecisionRepository: Send + Sync {
    /// All decisions of an organisation, ordered by id.
    async fn find_all(&self, organisation_id: &OrganisationId)
        -> Result<Vec<Decision>, DomainError>;

    /// Returns `None` if not found.
    async fn find_by_id(
        &self,
        organisation_id: &OrganisationId,
        id: &DecisionId,
    ) -> Result<Option<Decision>, DomainError>;

    /// Save a new decision.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the id is taken
    /// - `DatabaseError` on persistence failure
    async fn create(&self, decision: &Decision) -> Result<(), DomainError>;

    /// Replace an existing decision.
    ///
    /// # Errors
    ///
    /// - `DecisionNotFound` if the decision doesn't exist
    /// - `VersionConflict` if the decision changed since it was loaded
    /// - `DatabaseError` on persistence failure
    async fn update(&self, decision: &Decision) -> Result<(), DomainError>;

    /// # Errors
    ///
    /// - `DecisionNotFound` if the decision doesn't exist
    async fn delete(
        &self,
        organisation_id: &OrganisationId,
        id: &DecisionId,
    ) -> Result<(), DomainError>;

    /// Replace several existing decisions atomically.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if a decision belongs to another organisation
    /// - `DecisionNotFound` if any decision doesn't exist; nothing is written
    /// - `VersionConflict` if any decision changed since it was loaded;
    ///   nothing is written
    async fn apply_batch(
        &self,
        organisation_id: &OrganisationId,
        decisions: &[Decision],
    ) -> Result<(), DomainError>;

    /// Changes to every decision of the organisation.
    fn subscribe_all(&self, organisation_id: &OrganisationId) -> DecisionSubscription;

    /// Changes to a single decision.
    fn subscribe(&self, organisation_id: &OrganisationId, id: &DecisionId) -> DecisionSubscription;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::DecisionUpdate;
    use crate::domain::foundation::StakeholderId;
    use futures::StreamExt;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn DecisionRepository) {}

    fn decision(org: &str) -> Decision {
        Decision::create_empty(
            OrganisationId::new(org).unwrap(),
            StakeholderId::new("d1").unwrap(),
            DecisionUpdate::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn subscription_filters_by_organisation_and_decision() {
        let (sender, _) = broadcast::channel(16);
        let watched = decision("org-1");
        let other = decision("org-1");
        let foreign = decision("org-2");

        let mut all = DecisionSubscription::new(
            sender.subscribe(),
            OrganisationId::new("org-1").unwrap(),
            None,
        );
        let mut one = DecisionSubscription::new(
            sender.subscribe(),
            OrganisationId::new("org-1").unwrap(),
            Some(watched.id().clone()),
        );

        for d in [&foreign, &other, &watched] {
            sender.send(DecisionChange::Upserted(d.clone())).unwrap();
        }

        assert_eq!(all.next().await.unwrap().decision_id(), other.id());
        assert_eq!(all.next().await.unwrap().decision_id(), watched.id());
        assert_eq!(one.next().await.unwrap().decision_id(), watched.id());
    }

    #[tokio::test]
    async fn subscription_ends_when_sender_dropped() {
        let (sender, _) = broadcast::channel(4);
        let subscription = DecisionSubscription::new(
            sender.subscribe(),
            OrganisationId::new("org-1").unwrap(),
            None,
        );
        let d = decision("org-1");
        sender.send(DecisionChange::Upserted(d.clone())).unwrap();
        drop(sender);

        let changes: Vec<DecisionChange> = subscription.into_stream().collect().await;
        assert_eq!(changes, vec![DecisionChange::Upserted(d)]);
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_to_latest() {
        let (sender, _) = broadcast::channel(2);
        let mut subscription = DecisionSubscription::new(
            sender.subscribe(),
            OrganisationId::new("org-1").unwrap(),
            None,
        );
        let decisions: Vec<Decision> = (0..4).map(|_| decision("org-1")).collect();
        for d in &decisions {
            sender.send(DecisionChange::Upserted(d.clone())).unwrap();
        }

        assert_eq!(
            subscription.next().await.unwrap().decision_id(),
            decisions[2].id()
        );
    }
}
