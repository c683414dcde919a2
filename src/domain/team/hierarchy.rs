//! TeamHierarchy - Validated tree of teams within an organisation.
//!
//! Teams live in a flat arena keyed by id, each with an optional parent.
//! A `parent -> children` index is rebuilt from the arena after every
//! change, so the two views cannot drift apart. Every operation returns a
//! new, fully revalidated hierarchy or an error.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{TeamId, Version};

use super::TeamHierarchyError;

/// A team as stored in the arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamNode {
    id: TeamId,
    name: String,
    parent_id: Option<TeamId>,
}

impl TeamNode {
    pub fn id(&self) -> &TeamId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// None for root teams.
    pub fn parent_id(&self) -> Option<&TeamId> {
        self.parent_id.as_ref()
    }
}

/// Nested form of a team with its children, used for storage and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamHierarchyNode {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<TeamId>,
    #[serde(default)]
    pub children: BTreeMap<TeamId, TeamHierarchyNode>,
}

/// Input for adding or updating a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInput {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<TeamId>,
}

impl TeamInput {
    pub fn new(id: TeamId, name: impl Into<String>, parent_id: Option<TeamId>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
        }
    }
}

/// The team tree of one organisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<TeamId, TeamHierarchyNode>",
    into = "BTreeMap<TeamId, TeamHierarchyNode>"
)]
pub struct TeamHierarchy {
    teams: BTreeMap<TeamId, TeamNode>,
    children: BTreeMap<TeamId, BTreeSet<TeamId>>,
    /// Stored version; kept by every structural change. Not part of the
    /// serialized tree, repositories store it alongside.
    version: Version,
}

impl TeamHierarchy {
    /// An empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a hierarchy from the nested form.
    ///
    /// The map must hold every team at its top level, keyed by id. Each
    /// node's `children` must list exactly the teams whose `parent_id`
    /// points at it, and every nested child must equal its own top-level
    /// entry, subtree included.
    pub fn create(
        teams: BTreeMap<TeamId, TeamHierarchyNode>,
    ) -> Result<Self, TeamHierarchyError> {
        for (key, node) in &teams {
            check_node(key, node, &teams)?;
        }
        for node in teams.values() {
            if let Some(parent_id) = &node.parent_id {
                let listed = teams
                    .get(parent_id)
                    .is_some_and(|parent| parent.children.contains_key(&node.id));
                if !listed {
                    return Err(TeamHierarchyError::Inconsistent(format!(
                        "team {} is missing from the children of {}",
                        node.id, parent_id
                    )));
                }
            }
        }

        let arena = teams
            .into_values()
            .map(|node| {
                (
                    node.id.clone(),
                    TeamNode {
                        id: node.id,
                        name: node.name,
                        parent_id: node.parent_id,
                    },
                )
            })
            .collect();
        Self::from_arena(arena)
    }

    /// Adds a new leaf team.
    pub fn add_team(&self, input: TeamInput) -> Result<Self, TeamHierarchyError> {
        if self.teams.contains_key(&input.id) {
            return Err(TeamHierarchyError::DuplicateTeam(input.id));
        }
        if let Some(parent_id) = &input.parent_id {
            if !self.teams.contains_key(parent_id) {
                return Err(TeamHierarchyError::ParentNotFound(parent_id.clone()));
            }
        }
        let mut arena = self.teams.clone();
        arena.insert(
            input.id.clone(),
            TeamNode {
                id: input.id,
                name: input.name,
                parent_id: input.parent_id,
            },
        );
        self.rebuilt(arena)
    }

    /// Renames a team. Its position in the tree is left unchanged.
    ///
    /// # Errors
    ///
    /// `ReparentingRequiresMove` if `input.parent_id` differs from the
    /// current parent; use `move_team` for that.
    pub fn update_team(&self, input: TeamInput) -> Result<Self, TeamHierarchyError> {
        let current = self.require(&input.id)?;
        if current.parent_id != input.parent_id {
            return Err(TeamHierarchyError::ReparentingRequiresMove(input.id));
        }
        let mut arena = self.teams.clone();
        arena.insert(
            input.id.clone(),
            TeamNode {
                id: input.id,
                name: input.name,
                parent_id: input.parent_id,
            },
        );
        self.rebuilt(arena)
    }

    /// Moves a team, with its whole subtree, under a new parent.
    ///
    /// `None` makes it a root team.
    pub fn move_team(
        &self,
        id: &TeamId,
        new_parent_id: Option<&TeamId>,
    ) -> Result<Self, TeamHierarchyError> {
        self.require(id)?;
        if let Some(new_parent_id) = new_parent_id {
            if !self.teams.contains_key(new_parent_id) {
                return Err(TeamHierarchyError::ParentNotFound(new_parent_id.clone()));
            }
            let into_own_subtree = new_parent_id == id
                || self.ancestors(new_parent_id).iter().any(|a| a.id() == id);
            if into_own_subtree {
                return Err(TeamHierarchyError::WouldCreateCycle {
                    team_id: id.clone(),
                    new_parent_id: new_parent_id.clone(),
                });
            }
        }

        let mut arena = self.teams.clone();
        if let Some(node) = arena.get_mut(id) {
            node.parent_id = new_parent_id.cloned();
        }
        self.rebuilt(arena)
    }

    /// Removes a leaf team.
    pub fn remove_team(&self, id: &TeamId) -> Result<Self, TeamHierarchyError> {
        self.require(id)?;
        if self.children.contains_key(id) {
            return Err(TeamHierarchyError::HasChildren(id.clone()));
        }
        let mut arena = self.teams.clone();
        arena.remove(id);
        self.rebuilt(arena)
    }

    // ───────────────────────────────────────────────────────────────
    // Queries
    // ───────────────────────────────────────────────────────────────

    pub fn version(&self) -> Version {
        self.version
    }

    /// The copy a repository stores after accepting this value.
    pub fn next_version(&self) -> Self {
        self.clone().with_version(self.version.increment())
    }

    /// Restores the version a repository stored next to the tree.
    pub(crate) fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn team(&self, id: &TeamId) -> Option<&TeamNode> {
        self.teams.get(id)
    }

    pub fn contains(&self, id: &TeamId) -> bool {
        self.teams.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn teams(&self) -> impl Iterator<Item = &TeamNode> {
        self.teams.values()
    }

    pub fn root_teams(&self) -> Vec<&TeamNode> {
        self.teams
            .values()
            .filter(|t| t.parent_id.is_none())
            .collect()
    }

    /// Direct children; empty for leaves and unknown ids.
    pub fn children(&self, id: &TeamId) -> Vec<&TeamNode> {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.teams.get(child))
            .collect()
    }

    /// All teams below `id`, depth first.
    pub fn descendants(&self, id: &TeamId) -> Vec<&TeamNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&TeamNode> = self.children(id).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(&node.id).into_iter().rev());
        }
        out
    }

    /// Teams above `id`, nearest parent first.
    pub fn ancestors(&self, id: &TeamId) -> Vec<&TeamNode> {
        let mut out = Vec::new();
        let mut current = self.teams.get(id).and_then(|t| t.parent_id.as_ref());
        while let Some(parent_id) = current {
            let Some(parent) = self.teams.get(parent_id) else {
                break;
            };
            out.push(parent);
            current = parent.parent_id.as_ref();
        }
        out
    }

    /// The nested form: every team at the top level with its subtree.
    pub fn to_nodes(&self) -> BTreeMap<TeamId, TeamHierarchyNode> {
        self.teams
            .keys()
            .map(|id| (id.clone(), self.nested(id)))
            .collect()
    }

    // ───────────────────────────────────────────────────────────────
    // Internals
    // ───────────────────────────────────────────────────────────────

    /// Builds the children index and validates the arena.
    fn from_arena(teams: BTreeMap<TeamId, TeamNode>) -> Result<Self, TeamHierarchyError> {
        let mut children: BTreeMap<TeamId, BTreeSet<TeamId>> = BTreeMap::new();
        for (key, node) in &teams {
            if key != &node.id {
                return Err(TeamHierarchyError::Inconsistent(format!(
                    "team {} is stored under key {}",
                    node.id, key
                )));
            }
            if node.name.trim().is_empty() {
                return Err(TeamHierarchyError::EmptyName(node.id.clone()));
            }
            if let Some(parent_id) = &node.parent_id {
                if !teams.contains_key(parent_id) {
                    return Err(TeamHierarchyError::ParentNotFound(parent_id.clone()));
                }
                children
                    .entry(parent_id.clone())
                    .or_default()
                    .insert(node.id.clone());
            }
        }

        for node in teams.values() {
            if in_parent_cycle(&teams, &node.id) {
                return Err(TeamHierarchyError::Inconsistent(format!(
                    "team {} is its own ancestor",
                    node.id
                )));
            }
        }
        Ok(Self {
            teams,
            children,
            version: Version::initial(),
        })
    }

    fn rebuilt(&self, teams: BTreeMap<TeamId, TeamNode>) -> Result<Self, TeamHierarchyError> {
        Ok(Self::from_arena(teams)?.with_version(self.version))
    }

    fn require(&self, id: &TeamId) -> Result<&TeamNode, TeamHierarchyError> {
        self.teams
            .get(id)
            .ok_or_else(|| TeamHierarchyError::TeamNotFound(id.clone()))
    }

    fn nested(&self, id: &TeamId) -> TeamHierarchyNode {
        let (name, parent_id) = self
            .teams
            .get(id)
            .map(|t| (t.name.clone(), t.parent_id.clone()))
            .unwrap_or_default();
        TeamHierarchyNode {
            id: id.clone(),
            name,
            parent_id,
            children: self
                .children
                .get(id)
                .into_iter()
                .flatten()
                .map(|child| (child.clone(), self.nested(child)))
                .collect(),
        }
    }
}

/// Walks up from `id`; a chain longer than the team count must loop.
fn in_parent_cycle(teams: &BTreeMap<TeamId, TeamNode>, id: &TeamId) -> bool {
    let mut current = teams.get(id).and_then(|t| t.parent_id.as_ref());
    for _ in 0..teams.len() {
        match current {
            None => return false,
            Some(parent_id) => current = teams.get(parent_id).and_then(|t| t.parent_id.as_ref()),
        }
    }
    current.is_some()
}

/// Checks one top-level node and its direct children.
///
/// Every top-level entry is checked, so comparing each child with its own
/// entry covers the deeper levels too.
fn check_node(
    key: &TeamId,
    node: &TeamHierarchyNode,
    all: &BTreeMap<TeamId, TeamHierarchyNode>,
) -> Result<(), TeamHierarchyError> {
    if key != &node.id {
        return Err(TeamHierarchyError::Inconsistent(format!(
            "team {} is stored under key {}",
            node.id, key
        )));
    }
    if node.name.trim().is_empty() {
        return Err(TeamHierarchyError::EmptyName(node.id.clone()));
    }
    if let Some(parent_id) = &node.parent_id {
        if !all.contains_key(parent_id) {
            return Err(TeamHierarchyError::ParentNotFound(parent_id.clone()));
        }
    }
    for (child_key, child) in &node.children {
        if child.parent_id.as_ref() != Some(&node.id) {
            return Err(TeamHierarchyError::Inconsistent(format!(
                "team {} lists {} as a child, but its parent is {:?}",
                node.id,
                child.id,
                child.parent_id.as_ref().map(TeamId::as_str)
            )));
        }
        if child_key != &child.id {
            return Err(TeamHierarchyError::Inconsistent(format!(
                "team {} is listed under key {} in the children of {}",
                child.id, child_key, node.id
            )));
        }
        match all.get(&child.id) {
            None => {
                return Err(TeamHierarchyError::Inconsistent(format!(
                    "child team {} of {} is missing from the hierarchy",
                    child.id, node.id
                )))
            }
            Some(entry) if entry != child => {
                return Err(TeamHierarchyError::Inconsistent(format!(
                    "nested copy of team {} under {} differs from its top-level entry",
                    child.id, node.id
                )))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

impl TryFrom<BTreeMap<TeamId, TeamHierarchyNode>> for TeamHierarchy {
    type Error = TeamHierarchyError;

    fn try_from(teams: BTreeMap<TeamId, TeamHierarchyNode>) -> Result<Self, Self::Error> {
        TeamHierarchy::create(teams)
    }
}

impl From<TeamHierarchy> for BTreeMap<TeamId, TeamHierarchyNode> {
    fn from(hierarchy: TeamHierarchy) -> Self {
        hierarchy.to_nodes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tid(id: &str) -> TeamId {
        TeamId::new(id).unwrap()
    }

    fn input(id: &str, name: &str, parent: Option<&str>) -> TeamInput {
        TeamInput::new(tid(id), name, parent.map(tid))
    }

    /// eng -> {frontend, backend}, backend -> platform; ops is a root.
    fn sample() -> TeamHierarchy {
        TeamHierarchy::new()
            .add_team(input("eng", "Engineering", None))
            .and_then(|h| h.add_team(input("frontend", "Frontend", Some("eng"))))
            .and_then(|h| h.add_team(input("backend", "Backend", Some("eng"))))
            .and_then(|h| h.add_team(input("platform", "Platform", Some("backend"))))
            .and_then(|h| h.add_team(input("ops", "Operations", None)))
            .unwrap()
    }

    fn ids(nodes: Vec<&TeamNode>) -> Vec<&str> {
        nodes.into_iter().map(|n| n.id().as_str()).collect()
    }

    // ───────────────────────────────────────────────────────────────
    // Construction from the nested form
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn create_accepts_consistent_map() {
        let nodes = sample().to_nodes();
        let rebuilt = TeamHierarchy::create(nodes).unwrap();
        assert_eq!(rebuilt, sample());
    }

    #[test]
    fn create_rejects_unresolved_parent() {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            tid("a"),
            TeamHierarchyNode {
                id: tid("a"),
                name: "A".to_string(),
                parent_id: Some(tid("ghost")),
                children: BTreeMap::new(),
            },
        );
        assert!(matches!(
            TeamHierarchy::create(nodes),
            Err(TeamHierarchyError::ParentNotFound(_))
        ));
    }

    #[test]
    fn create_rejects_non_reciprocal_children() {
        let mut nodes = sample().to_nodes();
        if let Some(eng) = nodes.get_mut(&tid("eng")) {
            eng.children.remove(&tid("frontend"));
        }
        assert!(matches!(
            TeamHierarchy::create(nodes),
            Err(TeamHierarchyError::Inconsistent(_))
        ));

        let mut nodes = sample().to_nodes();
        if let Some(ops) = nodes.get_mut(&tid("ops")) {
            let mut stray = ops.clone();
            stray.id = tid("frontend");
            ops.children.insert(tid("frontend"), stray);
        }
        assert!(matches!(
            TeamHierarchy::create(nodes),
            Err(TeamHierarchyError::Inconsistent(_))
        ));
    }

    #[test]
    fn create_rejects_mismatched_key() {
        let mut nodes = sample().to_nodes();
        if let Some(ops) = nodes.remove(&tid("ops")) {
            nodes.insert(tid("operations"), ops);
        }
        assert!(matches!(
            TeamHierarchy::create(nodes),
            Err(TeamHierarchyError::Inconsistent(_))
        ));
    }

    #[test]
    fn create_rejects_parent_cycles() {
        let node = |id: &str, parent: &str, child: &str| {
            (
                tid(id),
                TeamHierarchyNode {
                    id: tid(id),
                    name: id.to_uppercase(),
                    parent_id: Some(tid(parent)),
                    children: BTreeMap::from([(
                        tid(child),
                        TeamHierarchyNode {
                            id: tid(child),
                            name: child.to_uppercase(),
                            parent_id: Some(tid(id)),
                            children: BTreeMap::new(),
                        },
                    )]),
                },
            )
        };
        let nodes = BTreeMap::from([node("a", "b", "b"), node("b", "a", "a")]);
        assert!(TeamHierarchy::create(nodes).is_err());
    }

    #[test]
    fn create_rejects_nested_copy_that_disagrees_with_top_level() {
        let mut nodes = sample().to_nodes();
        if let Some(frontend) = nodes
            .get_mut(&tid("eng"))
            .and_then(|eng| eng.children.get_mut(&tid("frontend")))
        {
            frontend.name = "Web".to_string();
        }
        assert!(matches!(
            TeamHierarchy::create(nodes),
            Err(TeamHierarchyError::Inconsistent(_))
        ));

        let mut nodes = sample().to_nodes();
        if let Some(backend) = nodes
            .get_mut(&tid("eng"))
            .and_then(|eng| eng.children.get_mut(&tid("backend")))
        {
            backend.children.clear();
        }
        assert!(matches!(
            TeamHierarchy::create(nodes),
            Err(TeamHierarchyError::Inconsistent(_))
        ));
    }

    #[test]
    fn structural_changes_keep_version() {
        let stored = sample().next_version();
        assert_eq!(stored.version().as_u32(), 2);

        let changed = stored
            .add_team(input("qa", "QA", None))
            .and_then(|t| t.move_team(&tid("qa"), Some(&tid("ops"))))
            .and_then(|t| t.update_team(input("qa", "Quality", Some("ops"))))
            .and_then(|t| t.remove_team(&tid("qa")))
            .unwrap();
        assert_eq!(changed.version(), stored.version());
        assert_eq!(changed, stored);
    }

    #[test]
    fn serde_round_trip_uses_nested_form() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["eng"]["children"]["backend"]["children"]["platform"]["name"], "Platform");
        let back: TeamHierarchy = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample());
    }

    // ───────────────────────────────────────────────────────────────
    // Structural operations
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn add_team_links_parent_and_child() {
        let tree = sample();
        assert_eq!(ids(tree.children(&tid("eng"))), vec!["backend", "frontend"]);
        assert_eq!(tree.team(&tid("frontend")).unwrap().parent_id(), Some(&tid("eng")));
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn add_team_rejects_duplicates_unknown_parents_and_blank_names() {
        let tree = sample();
        assert!(matches!(
            tree.add_team(input("eng", "Again", None)),
            Err(TeamHierarchyError::DuplicateTeam(_))
        ));
        assert!(matches!(
            tree.add_team(input("qa", "QA", Some("ghost"))),
            Err(TeamHierarchyError::ParentNotFound(_))
        ));
        assert!(matches!(
            tree.add_team(input("qa", "  ", None)),
            Err(TeamHierarchyError::EmptyName(_))
        ));
    }

    #[test]
    fn add_then_remove_leaf_round_trips() {
        let tree = sample();
        let round_trip = tree
            .add_team(input("qa", "QA", Some("frontend")))
            .and_then(|t| t.remove_team(&tid("qa")))
            .unwrap();
        assert_eq!(round_trip, tree);
    }

    #[test]
    fn update_team_renames_and_keeps_children() {
        let tree = sample()
            .update_team(input("backend", "Server", Some("eng")))
            .unwrap();
        assert_eq!(tree.team(&tid("backend")).unwrap().name(), "Server");
        assert_eq!(ids(tree.children(&tid("backend"))), vec!["platform"]);
    }

    #[test]
    fn update_team_refuses_reparenting() {
        assert!(matches!(
            sample().update_team(input("backend", "Backend", None)),
            Err(TeamHierarchyError::ReparentingRequiresMove(_))
        ));
        assert!(matches!(
            sample().update_team(input("ghost", "Ghost", None)),
            Err(TeamHierarchyError::TeamNotFound(_))
        ));
    }

    #[test]
    fn move_team_carries_subtree() {
        let tree = sample().move_team(&tid("backend"), Some(&tid("ops"))).unwrap();
        assert_eq!(ids(tree.children(&tid("eng"))), vec!["frontend"]);
        assert_eq!(ids(tree.children(&tid("ops"))), vec!["backend"]);
        assert_eq!(ids(tree.ancestors(&tid("platform"))), vec!["backend", "ops"]);
    }

    #[test]
    fn move_team_to_root() {
        let tree = sample().move_team(&tid("frontend"), None).unwrap();
        assert_eq!(ids(tree.root_teams()), vec!["eng", "frontend", "ops"]);
    }

    #[test]
    fn move_team_into_own_subtree_fails() {
        let tree = sample();
        for target in ["eng", "frontend", "platform"] {
            assert!(matches!(
                tree.move_team(&tid("eng"), Some(&tid(target))),
                Err(TeamHierarchyError::WouldCreateCycle { .. })
            ));
        }
        assert!(matches!(
            tree.move_team(&tid("eng"), Some(&tid("ghost"))),
            Err(TeamHierarchyError::ParentNotFound(_))
        ));
    }

    #[test]
    fn eng_cannot_move_under_its_frontend_team() {
        let tree = TeamHierarchy::new()
            .add_team(input("eng", "Eng", None))
            .and_then(|t| t.add_team(input("frontend", "Frontend", Some("eng"))))
            .unwrap();
        assert!(tree.move_team(&tid("eng"), Some(&tid("frontend"))).is_err());
    }

    #[test]
    fn remove_team_requires_leaf() {
        let tree = sample();
        assert!(matches!(
            tree.remove_team(&tid("backend")),
            Err(TeamHierarchyError::HasChildren(_))
        ));
        assert!(matches!(
            tree.remove_team(&tid("ghost")),
            Err(TeamHierarchyError::TeamNotFound(_))
        ));
        let tree = tree
            .remove_team(&tid("platform"))
            .and_then(|t| t.remove_team(&tid("backend")))
            .unwrap();
        assert_eq!(ids(tree.children(&tid("eng"))), vec!["frontend"]);
    }

    // ───────────────────────────────────────────────────────────────
    // Queries
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn descendants_walk_depth_first() {
        let tree = sample();
        assert_eq!(
            ids(tree.descendants(&tid("eng"))),
            vec!["backend", "platform", "frontend"]
        );
        assert!(tree.descendants(&tid("ops")).is_empty());
    }

    #[test]
    fn ancestors_stop_at_root() {
        let tree = sample();
        assert_eq!(ids(tree.ancestors(&tid("platform"))), vec!["backend", "eng"]);
        assert!(tree.ancestors(&tid("eng")).is_empty());
    }
}
