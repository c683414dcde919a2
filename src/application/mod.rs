//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod handlers;

pub use handlers::decision::{
    AddRelationshipCommand, AddRelationshipHandler, CreateDecisionCommand, CreateDecisionHandler,
    DecisionEdit, ListRelationshipsHandler, ListRelationshipsQuery, PublishDecisionCommand,
    PublishDecisionHandler, RelationshipFilter, RemoveRelationshipCommand,
    RemoveRelationshipHandler, UpdateDecisionCommand, UpdateDecisionHandler,
};
pub use handlers::team::{
    ChangeTeamHierarchyCommand, ChangeTeamHierarchyHandler, TeamHierarchyChange,
};
