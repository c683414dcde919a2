//! RelationshipGraph - Organisation-wide view of decision relationships.
//!
//! The graph holds every decision of one organisation and validates each
//! change against the full edge set before producing the rewritten
//! decisions. It never persists anything: callers write the returned
//! decisions through `DecisionRepository::apply_batch` and then `commit`
//! them back into the graph.
//!
//! # Invariants
//!
//! - Every edge is stored on both endpoints, forward type on the source and
//!   inverse type on the target.
//! - The `blocks` edges form a DAG, as do the `supersedes` edges.
//! - A decision is the source of at most one `supersedes` edge.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::domain::decision::Decision;
use crate::domain::foundation::{DecisionId, OrganisationId, ProjectId, TeamId, Timestamp};

use super::{DecisionRelationship, RelationshipError, RelationshipType};

/// Both endpoints rewritten by a single edge change.
///
/// The two decisions must be persisted together or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeWrite {
    pub source: Decision,
    pub target: Decision,
}

impl EdgeWrite {
    pub fn into_decisions(self) -> Vec<Decision> {
        vec![self.source, self.target]
    }
}

/// Endpoints rewritten by removing an edge.
///
/// An endpoint that was deleted is named by id but has no decision to
/// rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRemoval {
    pub source_id: DecisionId,
    pub target_id: DecisionId,
    /// Surviving endpoints, source first.
    pub decisions: Vec<Decision>,
}

/// All decisions of one organisation, indexed by id.
#[derive(Debug, Clone)]
pub struct RelationshipGraph {
    organisation_id: OrganisationId,
    decisions: BTreeMap<DecisionId, Decision>,
}

impl RelationshipGraph {
    /// Builds the graph, rejecting decisions from other organisations.
    pub fn new(
        organisation_id: OrganisationId,
        decisions: impl IntoIterator<Item = Decision>,
    ) -> Result<Self, RelationshipError> {
        let mut index = BTreeMap::new();
        for decision in decisions {
            if decision.organisation_id() != &organisation_id {
                return Err(RelationshipError::CrossOrganisation {
                    decision_id: decision.id().clone(),
                    organisation_id,
                });
            }
            index.insert(decision.id().clone(), decision);
        }
        Ok(Self {
            organisation_id,
            decisions: index,
        })
    }

    pub fn organisation_id(&self) -> &OrganisationId {
        &self.organisation_id
    }

    pub fn decision(&self, id: &DecisionId) -> Option<&Decision> {
        self.decisions.get(id)
    }

    pub fn decisions(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.values()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// Validates a new edge and returns both rewritten endpoints.
    ///
    /// Inverse types are normalised first, so `a blocked_by b` is checked
    /// and stored as `b blocks a`. Adding an edge that already exists
    /// rewrites it with a fresh timestamp.
    ///
    /// # Errors
    ///
    /// - `SelfRelationship`, `CrossOrganisation` and `HistoricalType` before
    ///   any lookup or traversal
    /// - `DecisionNotFound` if either endpoint is not part of the graph
    /// - `BlockerPublished` if a `blocks` source is already published, since
    ///   nothing would ever release the target
    /// - `DuplicateSupersession` if the source already supersedes another
    ///   decision
    /// - `CycleDetected` if the source is reachable from the target
    pub fn add_relationship(
        &self,
        from: &Decision,
        relationship_type: RelationshipType,
        to: &Decision,
    ) -> Result<EdgeWrite, RelationshipError> {
        if from.id() == to.id() {
            return Err(RelationshipError::SelfRelationship(from.id().clone()));
        }
        for endpoint in [from, to] {
            if endpoint.organisation_id() != &self.organisation_id {
                return Err(RelationshipError::CrossOrganisation {
                    decision_id: endpoint.id().clone(),
                    organisation_id: self.organisation_id.clone(),
                });
            }
        }
        if relationship_type.is_historical() {
            return Err(RelationshipError::HistoricalType(relationship_type));
        }

        let from = self.require(from.id())?;
        let to = self.require(to.id())?;
        let (source, target) = if relationship_type.is_forward() {
            (from, to)
        } else {
            (to, from)
        };
        let forward = relationship_type.forward();

        if forward == RelationshipType::Blocks && source.is_published() {
            return Err(RelationshipError::BlockerPublished(source.id().clone()));
        }

        if forward == RelationshipType::Supersedes {
            if let Some(existing) = source
                .relationships_by_type(RelationshipType::Supersedes)
                .into_iter()
                .find(|r| r.to_decision_id() != target.id())
            {
                return Err(RelationshipError::DuplicateSupersession {
                    decision_id: source.id().clone(),
                    existing_target: existing.to_decision_id().clone(),
                });
            }
        }

        if self.reaches(forward, target.id(), source.id()) {
            return Err(RelationshipError::CycleDetected {
                relationship_type: forward,
                from: source.id().clone(),
                to: target.id().clone(),
            });
        }

        let edge = DecisionRelationship::between(source, forward, target, Timestamp::now());
        Ok(EdgeWrite {
            target: target.put_relationship(edge.inverse()),
            source: source.put_relationship(edge),
        })
    }

    /// Removes an edge from both endpoints.
    ///
    /// Either orientation may be given; `a blocked_by b` removes `b blocks a`.
    /// Succeeds if at least one side holds the edge, repairing a half-written
    /// pair. One endpoint may be missing, so edges left behind by a deleted
    /// decision can still be cleared from the survivor.
    ///
    /// # Errors
    ///
    /// - `DecisionNotFound` if neither endpoint exists
    /// - `RelationshipNotFound` if no existing endpoint holds the edge
    pub fn remove_relationship(
        &self,
        from: &DecisionId,
        relationship_type: RelationshipType,
        to: &DecisionId,
    ) -> Result<EdgeRemoval, RelationshipError> {
        let (source_id, target_id) = if relationship_type.is_forward() {
            (from, to)
        } else {
            (to, from)
        };
        let forward = relationship_type.forward();

        let source = self.decisions.get(source_id);
        let target = self.decisions.get(target_id);
        if source.is_none() && target.is_none() {
            return Err(RelationshipError::DecisionNotFound(source_id.clone()));
        }

        let on_source = source.map_or(false, |d| d.relationship(forward, target_id).is_some());
        let on_target =
            target.map_or(false, |d| d.relationship(forward.inverse(), source_id).is_some());
        if !on_source && !on_target {
            return Err(RelationshipError::RelationshipNotFound(format!(
                "{}_{}_{}",
                source_id, forward, target_id
            )));
        }

        let decisions = source
            .map(|d| d.unset_relationship(forward, target_id))
            .into_iter()
            .chain(target.map(|d| d.unset_relationship(forward.inverse(), source_id)))
            .collect();

        Ok(EdgeRemoval {
            source_id: source_id.clone(),
            target_id: target_id.clone(),
            decisions,
        })
    }

    /// Turns the `blocks` edges of a newly published decision into history.
    ///
    /// Each `blocks` edge becomes `did_block` on `published` and the matching
    /// `blocked_by` becomes `was_blocked_by` on the target, which unblocks
    /// it. Returns `published` followed by every rewritten target; the
    /// batch must be persisted as a whole. Targets that were deleted are
    /// skipped, but their edge on `published` still becomes history.
    pub fn record_publication(
        &self,
        published: &Decision,
    ) -> Result<Vec<Decision>, RelationshipError> {
        if published.organisation_id() != &self.organisation_id {
            return Err(RelationshipError::CrossOrganisation {
                decision_id: published.id().clone(),
                organisation_id: self.organisation_id.clone(),
            });
        }
        if !published.is_published() {
            return Err(RelationshipError::NotPublished(published.id().clone()));
        }

        let blocking: Vec<DecisionRelationship> = published
            .relationships_by_type(RelationshipType::Blocks)
            .into_iter()
            .cloned()
            .collect();

        let mut source = published.clone();
        let mut targets = Vec::with_capacity(blocking.len());
        for edge in blocking {
            let history = edge.with_type(RelationshipType::DidBlock);
            source = source
                .unset_relationship(RelationshipType::Blocks, edge.to_decision_id())
                .put_relationship(history.clone());

            if let Some(target) = self.decisions.get(edge.to_decision_id()) {
                targets.push(
                    target
                        .unset_relationship(RelationshipType::BlockedBy, source.id())
                        .put_relationship(history.inverse()),
                );
            }
        }

        let mut batch = Vec::with_capacity(targets.len() + 1);
        batch.push(source);
        batch.extend(targets);
        Ok(batch)
    }

    /// Replaces the stored copies of the given decisions.
    ///
    /// Call after the batch was persisted. Decisions of other organisations
    /// are ignored.
    pub fn commit(&mut self, decisions: impl IntoIterator<Item = Decision>) {
        for decision in decisions {
            if decision.organisation_id() == &self.organisation_id {
                self.decisions.insert(decision.id().clone(), decision);
            }
        }
    }

    /// Every edge in the organisation, once, in forward orientation.
    pub fn relationships(&self) -> Vec<DecisionRelationship> {
        let mut seen = BTreeSet::new();
        let mut edges = Vec::new();
        for decision in self.decisions.values() {
            for rel in decision.relationships() {
                let forward = rel.to_forward();
                if seen.insert(forward.id()) {
                    edges.push(forward);
                }
            }
        }
        edges
    }

    /// Edges with at least one endpoint associated with the team.
    pub fn relationships_for_team(&self, team_id: &TeamId) -> Vec<DecisionRelationship> {
        self.relationships()
            .into_iter()
            .filter(|r| r.touches_team(team_id))
            .collect()
    }

    /// Edges with at least one endpoint associated with the project.
    pub fn relationships_for_project(&self, project_id: &ProjectId) -> Vec<DecisionRelationship> {
        self.relationships()
            .into_iter()
            .filter(|r| r.touches_project(project_id))
            .collect()
    }

    fn require(&self, id: &DecisionId) -> Result<&Decision, RelationshipError> {
        self.decisions
            .get(id)
            .ok_or_else(|| RelationshipError::DecisionNotFound(id.clone()))
    }

    /// Forward adjacency for one edge family, read from both sides of each
    /// pair so a half-written edge still counts.
    fn adjacency(&self, family: RelationshipType) -> HashMap<&DecisionId, BTreeSet<&DecisionId>> {
        let inverse = family.inverse();
        let mut adjacency: HashMap<&DecisionId, BTreeSet<&DecisionId>> = HashMap::new();
        for decision in self.decisions.values() {
            for rel in decision.relationships() {
                if rel.relationship_type() == family {
                    adjacency
                        .entry(rel.from_decision_id())
                        .or_default()
                        .insert(rel.to_decision_id());
                } else if rel.relationship_type() == inverse {
                    adjacency
                        .entry(rel.to_decision_id())
                        .or_default()
                        .insert(rel.from_decision_id());
                }
            }
        }
        adjacency
    }

    /// Breadth-first search from `start` along `family` edges.
    fn reaches(&self, family: RelationshipType, start: &DecisionId, goal: &DecisionId) -> bool {
        let adjacency = self.adjacency(family);
        let mut visited: HashSet<&DecisionId> = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(next) = adjacency.get(current) {
                queue.extend(next.iter().copied().filter(|id| !visited.contains(id)));
            }
        }
        false
    }
}
