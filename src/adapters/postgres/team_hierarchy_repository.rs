//! PostgreSQL implementation of TeamHierarchyRepository.
//!
//! The nested team map is stored as one JSONB value per organisation and
//! revalidated when loaded. The `version` column guards replacements the
//! same way as for decisions.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DomainError, ErrorCode, OrganisationId, Timestamp, Version};
use crate::domain::team::TeamHierarchy;
use crate::ports::TeamHierarchyRepository;

/// PostgreSQL implementation of TeamHierarchyRepository.
#[derive(Clone)]
pub struct PostgresTeamHierarchyRepository {
    pool: PgPool,
}

impl PostgresTeamHierarchyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamHierarchyRepository for PostgresTeamHierarchyRepository {
    async fn find(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<TeamHierarchy>, DomainError> {
        let row = sqlx::query(
            "SELECT teams, version FROM team_hierarchies WHERE organisation_id = $1",
        )
        .bind(organisation_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch team hierarchy", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Json(hierarchy): Json<TeamHierarchy> = row
            .try_get("teams")
            .map_err(|e| DomainError::database("Failed to decode team hierarchy", e))?;
        let version: i64 = row
            .try_get("version")
            .map_err(|e| DomainError::database("Failed to decode team hierarchy version", e))?;
        let version = u32::try_from(version)
            .map_err(|e| DomainError::database("Invalid team hierarchy version", e))
            .and_then(|v| {
                Version::from_u32(v)
                    .map_err(|e| DomainError::database("Invalid team hierarchy version", e))
            })?;

        Ok(Some(hierarchy.with_version(version)))
    }

    async fn save(
        &self,
        organisation_id: &OrganisationId,
        hierarchy: &TeamHierarchy,
    ) -> Result<(), DomainError> {
        let expected = hierarchy.version();
        let next = expected.increment();

        // A fresh tree may only claim an empty slot; a loaded one must
        // still match the stored version.
        let query = if expected.is_initial() {
            sqlx::query(
                r#"
                INSERT INTO team_hierarchies (organisation_id, teams, version, updated_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (organisation_id) DO NOTHING
                "#,
            )
        } else {
            sqlx::query(
                r#"
                UPDATE team_hierarchies SET teams = $2, version = $3, updated_at = $4
                WHERE organisation_id = $1 AND version = $5
                "#,
            )
        };

        let result = query
            .bind(organisation_id.as_str())
            .bind(Json(hierarchy))
            .bind(next.as_i64())
            .bind(*Timestamp::now().as_datetime())
            .bind(expected.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to save team hierarchy", e))?;

        if result.rows_affected() == 0 {
            let actual = sqlx::query_scalar::<_, i64>(
                "SELECT version FROM team_hierarchies WHERE organisation_id = $1",
            )
            .bind(organisation_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to read team hierarchy version", e))?;

            return Err(DomainError::version_conflict(
                "Team hierarchy",
                organisation_id,
                expected,
                actual.map_or_else(|| "none".to_string(), |v| v.to_string()),
            ));
        }

        Ok(())
    }

    async fn delete(&self, organisation_id: &OrganisationId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM team_hierarchies WHERE organisation_id = $1")
            .bind(organisation_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to delete team hierarchy", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::TeamHierarchyNotFound,
                format!("Team hierarchy not found for organisation {}", organisation_id),
            ));
        }
        Ok(())
    }
}
