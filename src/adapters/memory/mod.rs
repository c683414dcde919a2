//! In-memory adapters for tests and single-process deployments.

mod decision_repository;
mod team_hierarchy_repository;

pub use decision_repository::InMemoryDecisionRepository;
pub use team_hierarchy_repository::InMemoryTeamHierarchyRepository;
