//! Team hierarchy command handlers.

mod change_team_hierarchy;

pub use change_team_hierarchy::{
    ChangeTeamHierarchyCommand, ChangeTeamHierarchyError, ChangeTeamHierarchyHandler,
    ChangeTeamHierarchyResult, TeamHierarchyChange, TeamHierarchyChangedEvent,
};
