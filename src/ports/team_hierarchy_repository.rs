//! Team hierarchy repository port.
//!
//! Each organisation owns at most one hierarchy, stored and replaced as a
//! whole.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrganisationId};
use crate::domain::team::TeamHierarchy;

/// Repository port for team hierarchies.
#[async_trait]
pub trait TeamHierarchyRepository: Send + Sync {
    /// Returns `None` if the organisation has no hierarchy yet.
    async fn find(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<TeamHierarchy>, DomainError>;

    /// Create or replace the organisation's hierarchy atomically.
    ///
    /// A new tree can only be saved where nothing is stored; a loaded tree
    /// only while the stored version is unchanged.
    ///
    /// # Errors
    ///
    /// - `VersionConflict` if the stored hierarchy changed since it was
    ///   loaded
    async fn save(
        &self,
        organisation_id: &OrganisationId,
        hierarchy: &TeamHierarchy,
    ) -> Result<(), DomainError>;

    /// # Errors
    ///
    /// - `TeamHierarchyNotFound` if nothing is stored
    async fn delete(&self, organisation_id: &OrganisationId) -> Result<(), DomainError>;
}
