//! Decision command and query handlers.

// Command handlers
mod add_relationship;
mod create_decision;
mod publish_decision;
mod remove_relationship;
mod update_decision;

// Query handlers
mod list_relationships;

pub use add_relationship::{
    AddRelationshipCommand, AddRelationshipError, AddRelationshipHandler, AddRelationshipResult,
    RelationshipAddedEvent,
};
pub use create_decision::{
    CreateDecisionCommand, CreateDecisionError, CreateDecisionHandler, CreateDecisionResult,
    DecisionCreatedEvent,
};
pub use list_relationships::{
    ListRelationshipsError, ListRelationshipsHandler, ListRelationshipsQuery, RelationshipFilter,
};
pub use publish_decision::{
    DecisionPublishedEvent, PublishDecisionCommand, PublishDecisionError, PublishDecisionHandler,
    PublishDecisionResult,
};
pub use remove_relationship::{
    RelationshipRemovedEvent, RemoveRelationshipCommand, RemoveRelationshipError,
    RemoveRelationshipHandler, RemoveRelationshipResult,
};
pub use update_decision::{
    DecisionEdit, DecisionUpdatedEvent, UpdateDecisionCommand, UpdateDecisionError,
    UpdateDecisionHandler, UpdateDecisionResult,
};
