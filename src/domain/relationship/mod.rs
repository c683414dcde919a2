//! Relationship module - Typed edges between decisions.
//!
//! Edges are stored on both endpoint decisions. `RelationshipGraph` is the
//! only place that creates or removes them, so the two sides stay in step
//! and the blocking and supersession chains stay acyclic.

mod edge;
mod errors;
mod graph;

pub use edge::{DecisionRelationship, RelationshipKey, RelationshipType};
pub use errors::RelationshipError;
pub use graph::{EdgeRemoval, EdgeWrite, RelationshipGraph};
