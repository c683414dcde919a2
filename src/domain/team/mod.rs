//! Team module - The team hierarchy of an organisation.

mod errors;
mod hierarchy;

pub use errors::TeamHierarchyError;
pub use hierarchy::{TeamHierarchy, TeamHierarchyNode, TeamInput, TeamNode};
