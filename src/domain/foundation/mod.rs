//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, events, and error types
//! that form the vocabulary of the Decision Copilot domain.

mod command;
mod errors;
mod events;
mod ids;
mod timestamp;
mod version;

pub use command::CommandMetadata;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{
    domain_event, DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent,
};
pub use ids::{DecisionId, OrganisationId, ProjectId, StakeholderId, TeamId};
pub use timestamp::Timestamp;
pub use version::Version;
