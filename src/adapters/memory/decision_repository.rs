//! In-memory implementation of DecisionRepository.
//!
//! Backs tests and the `memory` store backend. All state sits behind one
//! `RwLock`, so a batch is checked and applied under a single write guard.
//! Replacements are accepted only while the stored version matches.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::adapters::ChangeBroadcaster;
use crate::domain::decision::Decision;
use crate::domain::foundation::{DecisionId, DomainError, ErrorCode, OrganisationId};
use crate::ports::{DecisionChange, DecisionRepository, DecisionSubscription};

type Store = HashMap<OrganisationId, BTreeMap<DecisionId, Decision>>;

pub struct InMemoryDecisionRepository {
    decisions: RwLock<Store>,
    changes: ChangeBroadcaster,
}

impl InMemoryDecisionRepository {
    pub fn new(changes: ChangeBroadcaster) -> Self {
        Self {
            decisions: RwLock::new(HashMap::new()),
            changes,
        }
    }

    /// Number of stored decisions across all organisations.
    pub async fn len(&self) -> usize {
        self.decisions.read().await.values().map(BTreeMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryDecisionRepository {
    fn default() -> Self {
        Self::new(ChangeBroadcaster::new(256))
    }
}

fn not_found(id: &DecisionId) -> DomainError {
    DomainError::new(ErrorCode::DecisionNotFound, format!("Decision not found: {}", id))
}

fn exists(store: &Store, decision: &Decision) -> bool {
    stored(store, decision).is_some()
}

fn stored<'a>(store: &'a Store, decision: &Decision) -> Option<&'a Decision> {
    store
        .get(decision.organisation_id())
        .and_then(|org| org.get(decision.id()))
}

/// Fails unless `decision` was loaded at the currently stored version.
fn check_replaceable(store: &Store, decision: &Decision) -> Result<(), DomainError> {
    let current = stored(store, decision).ok_or_else(|| not_found(decision.id()))?;
    if current.version() != decision.version() {
        return Err(DomainError::version_conflict(
            "Decision",
            decision.id(),
            decision.version(),
            current.version(),
        ));
    }
    Ok(())
}

#[async_trait]
impl DecisionRepository for InMemoryDecisionRepository {
    async fn find_all(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<Decision>, DomainError> {
        let store = self.decisions.read().await;
        Ok(store
            .get(organisation_id)
            .map(|org| org.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn find_by_id(
        &self,
        organisation_id: &OrganisationId,
        id: &DecisionId,
    ) -> Result<Option<Decision>, DomainError> {
        let store = self.decisions.read().await;
        Ok(store.get(organisation_id).and_then(|org| org.get(id)).cloned())
    }

    async fn create(&self, decision: &Decision) -> Result<(), DomainError> {
        let mut store = self.decisions.write().await;
        if exists(&store, decision) {
            return Err(DomainError::new(
                ErrorCode::AlreadyExists,
                format!("Decision already exists: {}", decision.id()),
            ));
        }
        store
            .entry(decision.organisation_id().clone())
            .or_default()
            .insert(decision.id().clone(), decision.clone());
        self.changes
            .notify([DecisionChange::Upserted(decision.clone())]);
        Ok(())
    }

    async fn update(&self, decision: &Decision) -> Result<(), DomainError> {
        let mut store = self.decisions.write().await;
        check_replaceable(&store, decision)?;

        let next = decision.next_version();
        store
            .entry(decision.organisation_id().clone())
            .or_default()
            .insert(next.id().clone(), next.clone());
        self.changes.notify([DecisionChange::Upserted(next)]);
        Ok(())
    }

    async fn delete(
        &self,
        organisation_id: &OrganisationId,
        id: &DecisionId,
    ) -> Result<(), DomainError> {
        let mut store = self.decisions.write().await;
        store
            .get_mut(organisation_id)
            .and_then(|org| org.remove(id))
            .ok_or_else(|| not_found(id))?;
        self.changes.notify([DecisionChange::Deleted {
            organisation_id: organisation_id.clone(),
            decision_id: id.clone(),
        }]);
        Ok(())
    }

    async fn apply_batch(
        &self,
        organisation_id: &OrganisationId,
        decisions: &[Decision],
    ) -> Result<(), DomainError> {
        let mut store = self.decisions.write().await;

        for decision in decisions {
            if decision.organisation_id() != organisation_id {
                return Err(DomainError::validation(
                    "organisation_id",
                    format!(
                        "Decision {} does not belong to organisation {}",
                        decision.id(),
                        organisation_id
                    ),
                ));
            }
            check_replaceable(&store, decision)?;
        }

        let committed: Vec<Decision> = decisions.iter().map(Decision::next_version).collect();
        let org = store.entry(organisation_id.clone()).or_default();
        for decision in &committed {
            org.insert(decision.id().clone(), decision.clone());
        }
        self.changes
            .notify(committed.into_iter().map(DecisionChange::Upserted));
        Ok(())
    }

    fn subscribe_all(&self, organisation_id: &OrganisationId) -> DecisionSubscription {
        self.changes.subscribe(organisation_id, None)
    }

    fn subscribe(&self, organisation_id: &OrganisationId, id: &DecisionId) -> DecisionSubscription {
        self.changes.subscribe(organisation_id, Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::DecisionUpdate;
    use crate::domain::foundation::StakeholderId;

    fn org() -> OrganisationId {
        OrganisationId::new("org-1").unwrap()
    }

    fn decision_in(org: OrganisationId) -> Decision {
        Decision::create_empty(org, StakeholderId::new("d1").unwrap(), DecisionUpdate::new())
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_find() {
        let repo = InMemoryDecisionRepository::default();
        let decision = decision_in(org());
        repo.create(&decision).await.unwrap();

        assert_eq!(
            repo.find_by_id(&org(), decision.id()).await.unwrap(),
            Some(decision.clone())
        );
        assert_eq!(repo.find_all(&org()).await.unwrap(), vec![decision]);
    }

    #[tokio::test]
    async fn find_is_scoped_by_organisation() {
        let repo = InMemoryDecisionRepository::default();
        let decision = decision_in(org());
        repo.create(&decision).await.unwrap();

        let other = OrganisationId::new("org-2").unwrap();
        assert!(repo.find_by_id(&other, decision.id()).await.unwrap().is_none());
        assert!(repo.find_all(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_existing_id() {
        let repo = InMemoryDecisionRepository::default();
        let decision = decision_in(org());
        repo.create(&decision).await.unwrap();
        let err = repo.create(&decision).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
    }

    #[tokio::test]
    async fn update_and_delete_require_existing_decision() {
        let repo = InMemoryDecisionRepository::default();
        let decision = decision_in(org());
        assert_eq!(
            repo.update(&decision).await.unwrap_err().code,
            ErrorCode::DecisionNotFound
        );
        assert_eq!(
            repo.delete(&org(), decision.id()).await.unwrap_err().code,
            ErrorCode::DecisionNotFound
        );

        repo.create(&decision).await.unwrap();
        repo.delete(&org(), decision.id()).await.unwrap();
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn apply_batch_is_all_or_nothing() {
        let repo = InMemoryDecisionRepository::default();
        let stored = decision_in(org());
        repo.create(&stored).await.unwrap();

        let changed = stored.with(DecisionUpdate::new().title("Changed")).unwrap();
        let missing = decision_in(org());
        let err = repo
            .apply_batch(&org(), &[changed.clone(), missing])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DecisionNotFound);
        assert_eq!(
            repo.find_by_id(&org(), stored.id()).await.unwrap(),
            Some(stored)
        );

        repo.apply_batch(&org(), &[changed.clone()]).await.unwrap();
        assert_eq!(
            repo.find_by_id(&org(), changed.id()).await.unwrap(),
            Some(changed.next_version())
        );
    }

    #[tokio::test]
    async fn stale_update_cannot_unpublish() {
        let repo = InMemoryDecisionRepository::default();
        let stale = decision_in(org())
            .with(DecisionUpdate::new().decision("Option A"))
            .unwrap();
        repo.create(&stale).await.unwrap();

        repo.update(&stale.publish().unwrap()).await.unwrap();

        let err = repo
            .update(&stale.with(DecisionUpdate::new().title("late edit")).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::VersionConflict);

        let stored = repo.find_by_id(&org(), stale.id()).await.unwrap().unwrap();
        assert!(stored.is_published());
        assert_eq!(stored.version().as_u32(), 2);
    }

    #[tokio::test]
    async fn stale_batch_writes_nothing() {
        let repo = InMemoryDecisionRepository::default();
        let a = decision_in(org());
        let b = decision_in(org());
        repo.create(&a).await.unwrap();
        repo.create(&b).await.unwrap();

        repo.update(&b.with(DecisionUpdate::new().title("moved on")).unwrap())
            .await
            .unwrap();

        let a2 = a.with(DecisionUpdate::new().title("A2")).unwrap();
        let b2 = b.with(DecisionUpdate::new().title("B2")).unwrap();
        let err = repo.apply_batch(&org(), &[a2, b2]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::VersionConflict);

        assert_eq!(repo.find_by_id(&org(), a.id()).await.unwrap(), Some(a));
        let b_stored = repo.find_by_id(&org(), b.id()).await.unwrap().unwrap();
        assert_eq!(b_stored.title(), "moved on");
    }

    #[tokio::test]
    async fn apply_batch_rejects_foreign_decisions() {
        let repo = InMemoryDecisionRepository::default();
        let foreign = decision_in(OrganisationId::new("org-2").unwrap());
        repo.create(&foreign).await.unwrap();
        let err = repo.apply_batch(&org(), &[foreign]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn subscribers_see_committed_changes() {
        let repo = InMemoryDecisionRepository::default();
        let decision = decision_in(org());
        let mut all = repo.subscribe_all(&org());
        let mut one = repo.subscribe(&org(), decision.id());

        repo.create(&decision_in(OrganisationId::new("org-2").unwrap()))
            .await
            .unwrap();
        repo.create(&decision).await.unwrap();
        repo.delete(&org(), decision.id()).await.unwrap();

        assert_eq!(
            all.next().await,
            Some(DecisionChange::Upserted(decision.clone()))
        );
        assert_eq!(
            one.next().await,
            Some(DecisionChange::Upserted(decision.clone()))
        );
        assert!(matches!(one.next().await, Some(DecisionChange::Deleted { .. })));
    }
}
