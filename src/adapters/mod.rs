//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `memory` - In-memory repositories for tests and single-process use
//! - `postgres` - PostgreSQL repositories (JSONB documents)
//! - `events` - Event bus implementations
//! - `notifications` - Change broadcasting shared by the repositories

pub mod events;
pub mod memory;
pub mod notifications;
pub mod postgres;

pub use events::InMemoryEventBus;
pub use memory::{InMemoryDecisionRepository, InMemoryTeamHierarchyRepository};
pub use notifications::ChangeBroadcaster;
pub use postgres::{PostgresDecisionRepository, PostgresTeamHierarchyRepository};
