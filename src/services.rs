//! Composition root: adapters chosen by configuration, handlers built on
//! demand.

use std::sync::Arc;

use crate::adapters::postgres::{self, PostgresDecisionRepository, PostgresTeamHierarchyRepository};
use crate::adapters::{
    ChangeBroadcaster, InMemoryDecisionRepository, InMemoryEventBus,
    InMemoryTeamHierarchyRepository,
};
use crate::application::handlers::decision::{
    AddRelationshipHandler, CreateDecisionHandler, ListRelationshipsHandler,
    PublishDecisionHandler, RemoveRelationshipHandler, UpdateDecisionHandler,
};
use crate::application::handlers::team::ChangeTeamHierarchyHandler;
use crate::config::{AppConfig, StoreBackend, ValidationError};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{DecisionRepository, EventPublisher, TeamHierarchyRepository};

/// Shared ports plus a factory method per handler.
#[derive(Clone)]
pub struct Services {
    pub decision_repository: Arc<dyn DecisionRepository>,
    pub team_hierarchy_repository: Arc<dyn TeamHierarchyRepository>,
    /// Concrete so callers can register event handlers on it.
    pub event_bus: Arc<InMemoryEventBus>,
}

impl Services {
    /// Wires the configured store backend.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the configuration is invalid
    /// - `DatabaseError` if the PostgreSQL pool cannot be opened or migrated
    pub async fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        config.validate().map_err(invalid_config)?;
        let changes = ChangeBroadcaster::new(config.store.notification_capacity);

        match (config.store.backend, &config.database) {
            (StoreBackend::Memory, _) => {
                tracing::info!(
                    capacity = config.store.notification_capacity,
                    "Using in-memory store"
                );
                Ok(Self::in_memory_with(changes))
            }
            (StoreBackend::Postgres, Some(database)) => {
                tracing::info!(url = %database.redacted_url(), "Using PostgreSQL store");
                let pool = postgres::connect(database).await?;
                Ok(Self {
                    decision_repository: Arc::new(PostgresDecisionRepository::new(
                        pool.clone(),
                        changes,
                    )),
                    team_hierarchy_repository: Arc::new(PostgresTeamHierarchyRepository::new(
                        pool,
                    )),
                    event_bus: Arc::new(InMemoryEventBus::new()),
                })
            }
            (StoreBackend::Postgres, None) => Err(invalid_config(
                ValidationError::MissingRequired("DATABASE__URL"),
            )),
        }
    }

    /// In-memory store with the given notification capacity.
    pub fn in_memory(notification_capacity: usize) -> Self {
        Self::in_memory_with(ChangeBroadcaster::new(notification_capacity))
    }

    fn in_memory_with(changes: ChangeBroadcaster) -> Self {
        Self {
            decision_repository: Arc::new(InMemoryDecisionRepository::new(changes)),
            team_hierarchy_repository: Arc::new(InMemoryTeamHierarchyRepository::new()),
            event_bus: Arc::new(InMemoryEventBus::new()),
        }
    }

    pub fn event_publisher(&self) -> Arc<dyn EventPublisher> {
        self.event_bus.clone()
    }

    pub fn create_decision_handler(&self) -> CreateDecisionHandler {
        CreateDecisionHandler::new(self.decision_repository.clone(), self.event_publisher())
    }

    pub fn update_decision_handler(&self) -> UpdateDecisionHandler {
        UpdateDecisionHandler::new(self.decision_repository.clone(), self.event_publisher())
    }

    pub fn publish_decision_handler(&self) -> PublishDecisionHandler {
        PublishDecisionHandler::new(self.decision_repository.clone(), self.event_publisher())
    }

    pub fn add_relationship_handler(&self) -> AddRelationshipHandler {
        AddRelationshipHandler::new(self.decision_repository.clone(), self.event_publisher())
    }

    pub fn remove_relationship_handler(&self) -> RemoveRelationshipHandler {
        RemoveRelationshipHandler::new(self.decision_repository.clone(), self.event_publisher())
    }

    pub fn list_relationships_handler(&self) -> ListRelationshipsHandler {
        ListRelationshipsHandler::new(self.decision_repository.clone())
    }

    pub fn change_team_hierarchy_handler(&self) -> ChangeTeamHierarchyHandler {
        ChangeTeamHierarchyHandler::new(
            self.team_hierarchy_repository.clone(),
            self.event_publisher(),
        )
    }
}

fn invalid_config(err: ValidationError) -> DomainError {
    DomainError::new(ErrorCode::ValidationFailed, err.to_string())
}
