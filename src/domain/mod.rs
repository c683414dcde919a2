//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, events)
//! - `decision` - Decision aggregate, workflow steps and stakeholder roles
//! - `relationship` - Blocking and supersession edges between decisions
//! - `team` - Team hierarchy tree per organisation

pub mod decision;
pub mod foundation;
pub mod relationship;
pub mod team;
