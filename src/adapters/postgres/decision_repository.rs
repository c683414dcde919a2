//! PostgreSQL implementation of DecisionRepository.
//!
//! Each decision is one row holding the full document as JSONB, keyed by
//! `(organisation_id, id)`. The `version` column guards replacements: an
//! update only matches the row while it still has the version the caller
//! loaded. Batches run in a single transaction. Change notifications are
//! broadcast in-process after commit.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::adapters::ChangeBroadcaster;
use crate::domain::decision::Decision;
use crate::domain::foundation::{DecisionId, DomainError, ErrorCode, OrganisationId};
use crate::ports::{DecisionChange, DecisionRepository, DecisionSubscription};

/// PostgreSQL implementation of DecisionRepository.
#[derive(Clone)]
pub struct PostgresDecisionRepository {
    pool: PgPool,
    changes: ChangeBroadcaster,
}

impl PostgresDecisionRepository {
    pub fn new(pool: PgPool, changes: ChangeBroadcaster) -> Self {
        Self { pool, changes }
    }
}

fn not_found(id: &DecisionId) -> DomainError {
    DomainError::new(ErrorCode::DecisionNotFound, format!("Decision not found: {}", id))
}

fn row_to_decision(row: sqlx::postgres::PgRow) -> Result<Decision, DomainError> {
    let Json(decision): Json<Decision> = row
        .try_get("document")
        .map_err(|e| DomainError::database("Failed to decode decision document", e))?;
    Ok(decision)
}

/// Replaces one row if its version still matches; returns the stored copy.
async fn update_row(
    tx: &mut Transaction<'_, Postgres>,
    decision: &Decision,
) -> Result<Decision, DomainError> {
    let next = decision.next_version();
    let result = sqlx::query(
        r#"
        UPDATE decisions SET
            document = $3,
            publish_date = $4,
            updated_at = $5,
            version = $6
        WHERE organisation_id = $1 AND id = $2 AND version = $7
        "#,
    )
    .bind(decision.organisation_id().as_str())
    .bind(decision.id().as_str())
    .bind(Json(&next))
    .bind(next.publish_date().map(|t| *t.as_datetime()))
    .bind(*next.updated_at().as_datetime())
    .bind(next.version().as_i64())
    .bind(decision.version().as_i64())
    .execute(&mut **tx)
    .await
    .map_err(|e| DomainError::database("Failed to update decision", e))?;

    if result.rows_affected() == 0 {
        return Err(missing_or_stale(tx, decision).await);
    }
    Ok(next)
}

/// Explains why an update matched no row.
async fn missing_or_stale(tx: &mut Transaction<'_, Postgres>, decision: &Decision) -> DomainError {
    let current = sqlx::query_scalar::<_, i64>(
        "SELECT version FROM decisions WHERE organisation_id = $1 AND id = $2",
    )
    .bind(decision.organisation_id().as_str())
    .bind(decision.id().as_str())
    .fetch_optional(&mut **tx)
    .await;

    match current {
        Ok(Some(actual)) => {
            DomainError::version_conflict("Decision", decision.id(), decision.version(), actual)
        }
        Ok(None) => not_found(decision.id()),
        Err(e) => DomainError::database("Failed to read decision version", e),
    }
}

#[async_trait]
impl DecisionRepository for PostgresDecisionRepository {
    async fn find_all(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Vec<Decision>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT document FROM decisions
            WHERE organisation_id = $1
            ORDER BY id
            "#,
        )
        .bind(organisation_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch decisions", e))?;

        tracing::debug!(organisation_id = %organisation_id, count = rows.len(), "Loaded decisions");
        rows.into_iter().map(row_to_decision).collect()
    }

    async fn find_by_id(
        &self,
        organisation_id: &OrganisationId,
        id: &DecisionId,
    ) -> Result<Option<Decision>, DomainError> {
        let row = sqlx::query(
            "SELECT document FROM decisions WHERE organisation_id = $1 AND id = $2",
        )
        .bind(organisation_id.as_str())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch decision", e))?;

        row.map(row_to_decision).transpose()
    }

    async fn create(&self, decision: &Decision) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO decisions (
                organisation_id, id, document, publish_date, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (organisation_id, id) DO NOTHING
            "#,
        )
        .bind(decision.organisation_id().as_str())
        .bind(decision.id().as_str())
        .bind(Json(decision))
        .bind(decision.publish_date().map(|t| *t.as_datetime()))
        .bind(*decision.created_at().as_datetime())
        .bind(*decision.updated_at().as_datetime())
        .bind(decision.version().as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to insert decision", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::AlreadyExists,
                format!("Decision already exists: {}", decision.id()),
            ));
        }

        self.changes
            .notify([DecisionChange::Upserted(decision.clone())]);
        Ok(())
    }

    async fn update(&self, decision: &Decision) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to begin transaction", e))?;

        let stored = update_row(&mut tx, decision).await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit decision update", e))?;

        self.changes.notify([DecisionChange::Upserted(stored)]);
        Ok(())
    }

    async fn delete(
        &self,
        organisation_id: &OrganisationId,
        id: &DecisionId,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM decisions WHERE organisation_id = $1 AND id = $2")
            .bind(organisation_id.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to delete decision", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

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
        if let Some(foreign) = decisions
            .iter()
            .find(|d| d.organisation_id() != organisation_id)
        {
            return Err(DomainError::validation(
                "organisation_id",
                format!(
                    "Decision {} does not belong to organisation {}",
                    foreign.id(),
                    organisation_id
                ),
            ));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to begin transaction", e))?;

        let mut committed = Vec::with_capacity(decisions.len());
        for decision in decisions {
            // An early return drops the transaction, rolling back earlier rows.
            committed.push(update_row(&mut tx, decision).await?);
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit decision batch", e))?;

        tracing::info!(
            organisation_id = %organisation_id,
            count = decisions.len(),
            "Decision batch committed"
        );
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
