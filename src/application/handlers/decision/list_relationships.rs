//! ListRelationshipsHandler - Query handler for an organisation's edges.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, OrganisationId, ProjectId, TeamId};
use crate::domain::relationship::{DecisionRelationship, RelationshipError, RelationshipGraph};
use crate::ports::DecisionRepository;

/// Which edges to return.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RelationshipFilter {
    #[default]
    All,
    /// Edges with an endpoint in the team.
    Team(TeamId),
    /// Edges with an endpoint in the project.
    Project(ProjectId),
}

#[derive(Debug, Clone)]
pub struct ListRelationshipsQuery {
    pub organisation_id: OrganisationId,
    pub filter: RelationshipFilter,
}

#[derive(Debug, Clone)]
pub enum ListRelationshipsError {
    Relationship(RelationshipError),
    Domain(DomainError),
}

impl std::fmt::Display for ListRelationshipsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListRelationshipsError::Relationship(err) => write!(f, "{}", err),
            ListRelationshipsError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ListRelationshipsError {}

impl From<RelationshipError> for ListRelationshipsError {
    fn from(err: RelationshipError) -> Self {
        ListRelationshipsError::Relationship(err)
    }
}

impl From<DomainError> for ListRelationshipsError {
    fn from(err: DomainError) -> Self {
        ListRelationshipsError::Domain(err)
    }
}

/// Returns each edge once, in forward orientation.
pub struct ListRelationshipsHandler {
    decision_repository: Arc<dyn DecisionRepository>,
}

impl ListRelationshipsHandler {
    pub fn new(decision_repository: Arc<dyn DecisionRepository>) -> Self {
        Self {
            decision_repository,
        }
    }

    pub async fn handle(
        &self,
        query: ListRelationshipsQuery,
    ) -> Result<Vec<DecisionRelationship>, ListRelationshipsError> {
        let decisions = self
            .decision_repository
            .find_all(&query.organisation_id)
            .await?;
        let graph = RelationshipGraph::new(query.organisation_id, decisions)?;

        let edges = match &query.filter {
            RelationshipFilter::All => graph.relationships(),
            RelationshipFilter::Team(team_id) => graph.relationships_for_team(team_id),
            RelationshipFilter::Project(project_id) => graph.relationships_for_project(project_id),
        };
        tracing::debug!(
            organisation_id = %graph.organisation_id(),
            filter = ?query.filter,
            edges = edges.len(),
            "Listed relationships"
        );
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::*;
    use crate::domain::decision::{Decision, DecisionUpdate};
    use crate::domain::relationship::RelationshipType;
    use std::collections::BTreeSet;

    fn in_team(title: &str, team: &str) -> Decision {
        Decision::create_empty(
            org(),
            driver(),
            DecisionUpdate::new()
                .title(title)
                .team_ids(BTreeSet::from([TeamId::new(team).unwrap()])),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn lists_each_edge_once_and_filters_by_team() {
        let (a, b) = blocking_pair(&in_team("A", "eng"), &in_team("B", "eng"));
        let (c, d) = blocking_pair(&in_team("C", "ops"), &in_team("D", "ops"));
        let repo = Arc::new(MockDecisionRepository::with_decisions(vec![a.clone(), b, c, d]));
        let handler = ListRelationshipsHandler::new(repo);

        let all = handler
            .handle(ListRelationshipsQuery {
                organisation_id: org(),
                filter: RelationshipFilter::All,
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all
            .iter()
            .all(|r| r.relationship_type() == RelationshipType::Blocks));

        let eng = handler
            .handle(ListRelationshipsQuery {
                organisation_id: org(),
                filter: RelationshipFilter::Team(TeamId::new("eng").unwrap()),
            })
            .await
            .unwrap();
        assert_eq!(eng.len(), 1);
        assert_eq!(eng[0].from_decision_id(), a.id());
    }

    #[tokio::test]
    async fn unknown_project_has_no_edges() {
        let (a, b) = blocking_pair(&draft("A"), &draft("B"));
        let handler =
            ListRelationshipsHandler::new(Arc::new(MockDecisionRepository::with_decisions(vec![a, b])));

        let edges = handler
            .handle(ListRelationshipsQuery {
                organisation_id: org(),
                filter: RelationshipFilter::Project(ProjectId::new("p-1").unwrap()),
            })
            .await
            .unwrap();
        assert!(edges.is_empty());
    }
}
