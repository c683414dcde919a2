//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresDecisionRepository` - Decision documents as JSONB rows
//! - `PostgresTeamHierarchyRepository` - One JSONB team tree per organisation

mod decision_repository;
mod team_hierarchy_repository;

pub use decision_repository::PostgresDecisionRepository;
pub use team_hierarchy_repository::PostgresTeamHierarchyRepository;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::domain::foundation::DomainError;

/// Opens a connection pool and, if configured, runs the bundled migrations.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::database("Failed to connect to database", e))?;

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DomainError::database("Failed to run migrations", e))?;
        tracing::info!("Database migrations applied");
    }

    Ok(pool)
}
