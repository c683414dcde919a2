//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `DecisionRepository` - Decision documents, batch writes and change feeds
//! - `TeamHierarchyRepository` - One team tree per organisation
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Port for publishing domain events
//! - `EventSubscriber` - Port for subscribing to domain events
//! - `EventHandler` - Handler that processes incoming events

mod decision_repository;
mod event_publisher;
mod event_subscriber;
mod team_hierarchy_repository;

pub use decision_repository::{DecisionChange, DecisionRepository, DecisionSubscription};
pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventBus, EventHandler, EventSubscriber};
pub use team_hierarchy_repository::TeamHierarchyRepository;
