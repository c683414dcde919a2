//! In-memory implementation of TeamHierarchyRepository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, OrganisationId, Version};
use crate::domain::team::TeamHierarchy;
use crate::ports::TeamHierarchyRepository;

#[derive(Default)]
pub struct InMemoryTeamHierarchyRepository {
    hierarchies: RwLock<HashMap<OrganisationId, TeamHierarchy>>,
}

impl InMemoryTeamHierarchyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeamHierarchyRepository for InMemoryTeamHierarchyRepository {
    async fn find(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<TeamHierarchy>, DomainError> {
        Ok(self.hierarchies.read().await.get(organisation_id).cloned())
    }

    async fn save(
        &self,
        organisation_id: &OrganisationId,
        hierarchy: &TeamHierarchy,
    ) -> Result<(), DomainError> {
        let mut hierarchies = self.hierarchies.write().await;

        // Saved trees are always past the initial version, so only a fresh
        // tree matches an empty slot.
        let stored = hierarchies
            .get(organisation_id)
            .map_or(Version::initial(), TeamHierarchy::version);
        if stored != hierarchy.version() {
            return Err(DomainError::version_conflict(
                "Team hierarchy",
                organisation_id,
                hierarchy.version(),
                stored,
            ));
        }

        hierarchies.insert(organisation_id.clone(), hierarchy.next_version());
        Ok(())
    }

    async fn delete(&self, organisation_id: &OrganisationId) -> Result<(), DomainError> {
        self.hierarchies
            .write()
            .await
            .remove(organisation_id)
            .map(|_| ())
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::TeamHierarchyNotFound,
                    format!("Team hierarchy not found for organisation {}", organisation_id),
                )
            })
    }
}
