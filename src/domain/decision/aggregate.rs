//! Decision aggregate - A single choice tracked through the workflow.
//!
//! A Decision is an immutable value. Every operation returns a new Decision
//! or fails; a failed operation never leaves a partially changed value.
//! Published decisions reject direct edits; only relationship changes
//! (superseding, block history) may still touch them.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DecisionId, OrganisationId, ProjectId, StakeholderId, TeamId, Timestamp, ValidationError,
    Version,
};
use crate::domain::relationship::{DecisionRelationship, RelationshipKey, RelationshipType};

use super::{
    Cost, DecisionError, DecisionMethod, DecisionStakeholder, DecisionStateError, DecisionStatus,
    DecisionUpdate, Reversibility, StakeholderError, StakeholderRole, SupportingMaterial,
    WorkflowStep,
};

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 500;

/// Plain record form of a decision.
///
/// Used to construct decisions from stored data and as the serialized
/// representation. `Decision::create` validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionProps {
    pub id: DecisionId,
    pub organisation_id: OrganisationId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub cost: Cost,
    pub reversibility: Reversibility,
    pub driver_stakeholder_id: StakeholderId,
    #[serde(default)]
    pub stakeholders: Vec<DecisionStakeholder>,
    #[serde(default)]
    pub decision_method: Option<DecisionMethod>,
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub supporting_materials: Vec<SupportingMaterial>,
    #[serde(default)]
    pub publish_date: Option<Timestamp>,
    #[serde(default)]
    pub team_ids: BTreeSet<TeamId>,
    #[serde(default)]
    pub project_ids: BTreeSet<ProjectId>,
    #[serde(default)]
    pub relationships: Vec<DecisionRelationship>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub version: Version,
}

/// The Decision aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DecisionProps", into = "DecisionProps")]
pub struct Decision {
    id: DecisionId,
    organisation_id: OrganisationId,
    title: String,
    description: String,
    cost: Cost,
    reversibility: Reversibility,
    driver_stakeholder_id: StakeholderId,
    stakeholders: Vec<DecisionStakeholder>,
    decision_method: Option<DecisionMethod>,
    decision: Option<String>,
    supporting_materials: Vec<SupportingMaterial>,
    publish_date: Option<Timestamp>,
    team_ids: BTreeSet<TeamId>,
    project_ids: BTreeSet<ProjectId>,
    relationships: BTreeMap<RelationshipKey, DecisionRelationship>,
    created_at: Timestamp,
    updated_at: Timestamp,
    version: Version,
}

impl Decision {
    /// Validates a plain record and builds a decision from it.
    ///
    /// # Errors
    ///
    /// - `Validation` if the title is too long, the chosen option is blank,
    ///   the driver is not a stakeholder, or a relationship belongs to a
    ///   different decision or organisation
    /// - `Stakeholder` if a stakeholder appears twice
    pub fn create(props: DecisionProps) -> Result<Self, DecisionError> {
        let mut relationships = BTreeMap::new();
        for rel in props.relationships {
            if rel.from_decision_id() != &props.id {
                return Err(ValidationError::invalid_format(
                    "relationships",
                    format!("relationship {} does not start at decision {}", rel.id(), props.id),
                )
                .into());
            }
            if rel.organisation_id() != &props.organisation_id {
                return Err(ValidationError::invalid_format(
                    "relationships",
                    format!("relationship {} belongs to another organisation", rel.id()),
                )
                .into());
            }
            relationships.insert(rel.key(), rel);
        }

        let decision = Self {
            id: props.id,
            organisation_id: props.organisation_id,
            title: props.title,
            description: props.description,
            cost: props.cost,
            reversibility: props.reversibility,
            driver_stakeholder_id: props.driver_stakeholder_id,
            stakeholders: props.stakeholders,
            decision_method: props.decision_method,
            decision: props.decision,
            supporting_materials: props.supporting_materials,
            publish_date: props.publish_date,
            team_ids: props.team_ids,
            project_ids: props.project_ids,
            relationships,
            created_at: props.created_at,
            updated_at: props.updated_at,
            version: props.version,
        };
        decision.validate()?;
        Ok(decision)
    }

    /// Starts a new decision with a generated id and workflow defaults.
    ///
    /// Defaults are cost low, reversibility hat, and a stakeholder set that
    /// holds only the driver. `overrides` is applied on top.
    pub fn create_empty(
        organisation_id: OrganisationId,
        driver_stakeholder_id: StakeholderId,
        overrides: DecisionUpdate,
    ) -> Result<Self, DecisionError> {
        let now = Timestamp::now();
        let decision = Self {
            id: DecisionId::generate(),
            organisation_id,
            title: String::new(),
            description: String::new(),
            cost: Cost::default(),
            reversibility: Reversibility::default(),
            stakeholders: vec![DecisionStakeholder::new(
                driver_stakeholder_id.clone(),
                StakeholderRole::default(),
            )],
            driver_stakeholder_id,
            decision_method: None,
            decision: None,
            supporting_materials: Vec::new(),
            publish_date: None,
            team_ids: BTreeSet::new(),
            project_ids: BTreeSet::new(),
            relationships: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            version: Version::initial(),
        };
        decision.apply(overrides)
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> &DecisionId {
        &self.id
    }

    pub fn organisation_id(&self) -> &OrganisationId {
        &self.organisation_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn reversibility(&self) -> Reversibility {
        self.reversibility
    }

    pub fn driver_stakeholder_id(&self) -> &StakeholderId {
        &self.driver_stakeholder_id
    }

    /// Stakeholders in the order they were added.
    pub fn stakeholders(&self) -> &[DecisionStakeholder] {
        &self.stakeholders
    }

    pub fn decision_method(&self) -> Option<DecisionMethod> {
        self.decision_method
    }

    /// The chosen option, once made.
    pub fn decision(&self) -> Option<&str> {
        self.decision.as_deref()
    }

    pub fn supporting_materials(&self) -> &[SupportingMaterial] {
        &self.supporting_materials
    }

    pub fn publish_date(&self) -> Option<Timestamp> {
        self.publish_date
    }

    pub fn team_ids(&self) -> &BTreeSet<TeamId> {
        &self.team_ids
    }

    pub fn project_ids(&self) -> &BTreeSet<ProjectId> {
        &self.project_ids
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Stored version this value was loaded at. Edits keep it unchanged.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The copy a repository stores after accepting this value.
    pub fn next_version(&self) -> Self {
        let mut next = self.clone();
        next.version = self.version.increment();
        next
    }

    /// Returns the stakeholder entry for `id`, if present.
    pub fn stakeholder(&self, id: &StakeholderId) -> Option<&DecisionStakeholder> {
        self.stakeholders.iter().find(|s| &s.stakeholder_id == id)
    }

    pub fn has_stakeholder(&self, id: &StakeholderId) -> bool {
        self.stakeholder(id).is_some()
    }

    /// Returns the ids of stakeholders holding `role`.
    pub fn stakeholders_with_role(&self, role: StakeholderRole) -> Vec<&StakeholderId> {
        self.stakeholders
            .iter()
            .filter(|s| s.role == role)
            .map(|s| &s.stakeholder_id)
            .collect()
    }

    pub fn decider_ids(&self) -> Vec<&StakeholderId> {
        self.stakeholders_with_role(StakeholderRole::Decider)
    }

    // ───────────────────────────────────────────────────────────────
    // Derived state
    // ───────────────────────────────────────────────────────────────

    pub fn is_published(&self) -> bool {
        self.publish_date.is_some()
    }

    pub fn is_blocked(&self) -> bool {
        self.has_relationship_type(RelationshipType::BlockedBy)
    }

    pub fn is_superseded(&self) -> bool {
        self.has_relationship_type(RelationshipType::SupersededBy)
    }

    /// Superseded beats published, published beats blocked.
    pub fn status(&self) -> DecisionStatus {
        if self.is_superseded() {
            DecisionStatus::Superseded
        } else if self.is_published() {
            DecisionStatus::Published
        } else if self.is_blocked() {
            DecisionStatus::Blocked
        } else {
            DecisionStatus::InProgress
        }
    }

    /// Furthest workflow step the current data supports.
    ///
    /// Derived on every call, so removing data moves the step back.
    pub fn current_step(&self) -> WorkflowStep {
        if self.status().is_final() {
            WorkflowStep::Publish
        } else if self.decision.is_some() {
            WorkflowStep::Choose
        } else if self.decision_method.is_some() {
            WorkflowStep::Method
        } else if self.non_driver_stakeholder_count() > 0 {
            WorkflowStep::Stakeholders
        } else {
            WorkflowStep::Identify
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Relationship map
    // ───────────────────────────────────────────────────────────────

    pub fn relationships(&self) -> impl Iterator<Item = &DecisionRelationship> {
        self.relationships.values()
    }

    pub fn relationships_by_type(
        &self,
        relationship_type: RelationshipType,
    ) -> Vec<&DecisionRelationship> {
        self.relationships
            .values()
            .filter(|r| r.relationship_type() == relationship_type)
            .collect()
    }

    pub fn relationship(
        &self,
        relationship_type: RelationshipType,
        target: &DecisionId,
    ) -> Option<&DecisionRelationship> {
        self.relationships
            .get(&RelationshipKey::new(relationship_type, target.clone()))
    }

    pub fn has_relationship_type(&self, relationship_type: RelationshipType) -> bool {
        self.relationships
            .keys()
            .any(|k| k.relationship_type == relationship_type)
    }

    /// Records a relationship to `target` in this decision's map only.
    ///
    /// The inverse entry on `target` is the caller's job; use
    /// `RelationshipGraph` to keep both sides in step.
    pub fn set_relationship(&self, relationship_type: RelationshipType, target: &Decision) -> Self {
        self.put_relationship(DecisionRelationship::between(
            self,
            relationship_type,
            target,
            Timestamp::now(),
        ))
    }

    /// Removes a relationship from this decision's map only.
    pub fn unset_relationship(
        &self,
        relationship_type: RelationshipType,
        target: &DecisionId,
    ) -> Self {
        let mut next = self.clone();
        if next
            .relationships
            .remove(&RelationshipKey::new(relationship_type, target.clone()))
            .is_some()
        {
            next.touch();
        }
        next
    }

    pub(crate) fn put_relationship(&self, relationship: DecisionRelationship) -> Self {
        let mut next = self.clone();
        next.relationships.insert(relationship.key(), relationship);
        next.touch();
        next
    }

    // ───────────────────────────────────────────────────────────────
    // Field updates
    // ───────────────────────────────────────────────────────────────

    /// Returns a copy with `update` merged in and `updated_at` refreshed.
    ///
    /// # Errors
    ///
    /// - `State(Immutable)` if the decision is published
    /// - `Validation` if the result violates a field rule
    pub fn with(&self, update: DecisionUpdate) -> Result<Self, DecisionError> {
        self.ensure_editable()?;
        let mut next = self.apply(update)?;
        next.touch();
        Ok(next)
    }

    /// Adds a stakeholder at the end of the list.
    pub fn add_stakeholder(
        &self,
        stakeholder_id: StakeholderId,
        role: StakeholderRole,
    ) -> Result<Self, DecisionError> {
        self.ensure_editable()?;
        if self.has_stakeholder(&stakeholder_id) {
            return Err(StakeholderError::AlreadyPresent(stakeholder_id).into());
        }
        let mut next = self.clone();
        next.stakeholders
            .push(DecisionStakeholder::new(stakeholder_id, role));
        next.touch();
        Ok(next)
    }

    /// Removes a stakeholder; the driver cannot be removed.
    pub fn remove_stakeholder(&self, stakeholder_id: &StakeholderId) -> Result<Self, DecisionError> {
        self.ensure_editable()?;
        if stakeholder_id == &self.driver_stakeholder_id {
            return Err(StakeholderError::CannotRemoveDriver(stakeholder_id.clone()).into());
        }
        if !self.has_stakeholder(stakeholder_id) {
            return Err(StakeholderError::NotPresent(stakeholder_id.clone()).into());
        }
        let mut next = self.clone();
        next.stakeholders
            .retain(|s| &s.stakeholder_id != stakeholder_id);
        next.touch();
        Ok(next)
    }

    /// Changes the role of an existing stakeholder.
    pub fn set_stakeholder_role(
        &self,
        stakeholder_id: &StakeholderId,
        role: StakeholderRole,
    ) -> Result<Self, DecisionError> {
        self.ensure_editable()?;
        let mut next = self.clone();
        let entry = next
            .stakeholders
            .iter_mut()
            .find(|s| &s.stakeholder_id == stakeholder_id)
            .ok_or_else(|| StakeholderError::NotPresent(stakeholder_id.clone()))?;
        entry.role = role;
        next.touch();
        Ok(next)
    }

    /// Hands the driver role to `stakeholder_id`.
    ///
    /// The new driver is added as a stakeholder if needed and the previous
    /// driver is removed from the stakeholder list. Reassigning the current
    /// driver returns an unchanged copy.
    pub fn set_decision_driver(&self, stakeholder_id: StakeholderId) -> Result<Self, DecisionError> {
        self.ensure_editable()?;
        if stakeholder_id == self.driver_stakeholder_id {
            return Ok(self.clone());
        }
        let mut next = self.clone();
        if !next.has_stakeholder(&stakeholder_id) {
            next.stakeholders.push(DecisionStakeholder::new(
                stakeholder_id.clone(),
                StakeholderRole::default(),
            ));
        }
        let previous = std::mem::replace(&mut next.driver_stakeholder_id, stakeholder_id);
        next.stakeholders.retain(|s| s.stakeholder_id != previous);
        next.touch();
        Ok(next)
    }

    /// Appends a supporting material; urls must be unique.
    pub fn add_supporting_material(
        &self,
        material: SupportingMaterial,
    ) -> Result<Self, DecisionError> {
        self.ensure_editable()?;
        if self
            .supporting_materials
            .iter()
            .any(|m| m.url() == material.url())
        {
            return Err(DecisionError::DuplicateMaterial(material.url().to_string()));
        }
        let mut next = self.clone();
        next.supporting_materials.push(material);
        next.touch();
        Ok(next)
    }

    /// Removes the supporting material with the given url.
    pub fn remove_supporting_material(&self, url: &str) -> Result<Self, DecisionError> {
        self.ensure_editable()?;
        if !self.supporting_materials.iter().any(|m| m.url() == url) {
            return Err(DecisionError::MaterialNotFound(url.to_string()));
        }
        let mut next = self.clone();
        next.supporting_materials.retain(|m| m.url() != url);
        next.touch();
        Ok(next)
    }

    /// Publishes the decision.
    ///
    /// # Errors
    ///
    /// - `AlreadyPublished` if already published
    /// - `Superseded` if another decision supersedes this one
    /// - `Blocked` while a `blocked_by` relationship is active
    /// - `NoOptionChosen` if no option has been chosen
    pub fn publish(&self) -> Result<Self, DecisionError> {
        if self.is_published() {
            return Err(DecisionStateError::AlreadyPublished(self.id.clone()).into());
        }
        if self.is_superseded() {
            return Err(DecisionStateError::Superseded(self.id.clone()).into());
        }
        if self.is_blocked() {
            return Err(DecisionStateError::Blocked(self.id.clone()).into());
        }
        if self.decision.is_none() {
            return Err(DecisionStateError::NoOptionChosen(self.id.clone()).into());
        }
        let now = Timestamp::now();
        let mut next = self.clone();
        next.publish_date = Some(now);
        next.updated_at = now;
        Ok(next)
    }

    // ───────────────────────────────────────────────────────────────
    // Internals
    // ───────────────────────────────────────────────────────────────

    fn ensure_editable(&self) -> Result<(), DecisionStateError> {
        if self.is_published() {
            return Err(DecisionStateError::Immutable(self.id.clone()));
        }
        Ok(())
    }

    fn apply(&self, update: DecisionUpdate) -> Result<Self, DecisionError> {
        let mut next = self.clone();
        if let Some(title) = update.title {
            next.title = title;
        }
        if let Some(description) = update.description {
            next.description = description;
        }
        if let Some(cost) = update.cost {
            next.cost = cost;
        }
        if let Some(reversibility) = update.reversibility {
            next.reversibility = reversibility;
        }
        if let Some(method) = update.decision_method {
            next.decision_method = method;
        }
        if let Some(decision) = update.decision {
            next.decision = decision;
        }
        if let Some(materials) = update.supporting_materials {
            next.supporting_materials = materials;
        }
        if let Some(team_ids) = update.team_ids {
            next.team_ids = team_ids;
        }
        if let Some(project_ids) = update.project_ids {
            next.project_ids = project_ids;
        }
        next.validate()?;
        Ok(next)
    }

    fn validate(&self) -> Result<(), DecisionError> {
        let title_length = self.title.chars().count();
        if title_length > MAX_TITLE_LENGTH {
            return Err(ValidationError::too_long("title", MAX_TITLE_LENGTH, title_length).into());
        }

        if let Some(decision) = &self.decision {
            if decision.trim().is_empty() {
                return Err(ValidationError::empty_field("decision").into());
            }
        }

        let mut seen = HashSet::new();
        for stakeholder in &self.stakeholders {
            if !seen.insert(&stakeholder.stakeholder_id) {
                return Err(
                    StakeholderError::AlreadyPresent(stakeholder.stakeholder_id.clone()).into(),
                );
            }
        }
        if !seen.contains(&self.driver_stakeholder_id) {
            return Err(ValidationError::invalid_format(
                "stakeholders",
                format!(
                    "driver {} must be one of the stakeholders",
                    self.driver_stakeholder_id
                ),
            )
            .into());
        }

        let mut urls = HashSet::new();
        for material in &self.supporting_materials {
            if material.title().trim().is_empty() {
                return Err(ValidationError::empty_field("supporting_material.title").into());
            }
            if material.url().trim().is_empty() {
                return Err(ValidationError::empty_field("supporting_material.url").into());
            }
            if !urls.insert(material.url()) {
                return Err(DecisionError::DuplicateMaterial(material.url().to_string()));
            }
        }

        Ok(())
    }

    fn non_driver_stakeholder_count(&self) -> usize {
        self.stakeholders
            .iter()
            .filter(|s| s.stakeholder_id != self.driver_stakeholder_id)
            .count()
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

impl TryFrom<DecisionProps> for Decision {
    type Error = DecisionError;

    fn try_from(props: DecisionProps) -> Result<Self, Self::Error> {
        Decision::create(props)
    }
}

impl From<Decision> for DecisionProps {
    fn from(decision: Decision) -> Self {
        DecisionProps {
            id: decision.id,
            organisation_id: decision.organisation_id,
            title: decision.title,
            description: decision.description,
            cost: decision.cost,
            reversibility: decision.reversibility,
            driver_stakeholder_id: decision.driver_stakeholder_id,
            stakeholders: decision.stakeholders,
            decision_method: decision.decision_method,
            decision: decision.decision,
            supporting_materials: decision.supporting_materials,
            publish_date: decision.publish_date,
            team_ids: decision.team_ids,
            project_ids: decision.project_ids,
            relationships: decision.relationships.into_values().collect(),
            created_at: decision.created_at,
            updated_at: decision.updated_at,
            version: decision.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org() -> OrganisationId {
        OrganisationId::new("org-1").unwrap()
    }

    fn sid(id: &str) -> StakeholderId {
        StakeholderId::new(id).unwrap()
    }

    fn new_decision() -> Decision {
        Decision::create_empty(org(), sid("d1"), DecisionUpdate::new().title("Pick a database"))
            .unwrap()
    }

    fn props() -> DecisionProps {
        DecisionProps {
            id: DecisionId::new("dec-1").unwrap(),
            organisation_id: org(),
            title: "Adopt Rust".to_string(),
            description: String::new(),
            cost: Cost::Medium,
            reversibility: Reversibility::Haircut,
            driver_stakeholder_id: sid("d1"),
            stakeholders: vec![DecisionStakeholder::new(sid("d1"), StakeholderRole::Decider)],
            decision_method: None,
            decision: None,
            supporting_materials: Vec::new(),
            publish_date: None,
            team_ids: BTreeSet::new(),
            project_ids: BTreeSet::new(),
            relationships: Vec::new(),
            created_at: Timestamp::from_unix_secs(1_000),
            updated_at: Timestamp::from_unix_secs(1_000),
            version: Version::initial(),
        }
    }

    fn chosen() -> Decision {
        new_decision()
            .with(DecisionUpdate::new().decision("Postgres"))
            .unwrap()
    }

    // ───────────────────────────────────────────────────────────────
    // Construction
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn create_accepts_valid_props() {
        let decision = Decision::create(props()).unwrap();
        assert_eq!(decision.id().as_str(), "dec-1");
        assert_eq!(decision.cost(), Cost::Medium);
        assert_eq!(decision.status(), DecisionStatus::InProgress);
    }

    #[test]
    fn create_rejects_driver_missing_from_stakeholders() {
        let mut p = props();
        p.stakeholders = vec![DecisionStakeholder::new(sid("s2"), StakeholderRole::Informed)];
        assert!(matches!(
            Decision::create(p),
            Err(DecisionError::Validation(ValidationError::InvalidFormat { .. }))
        ));
    }

    #[test]
    fn create_rejects_duplicate_stakeholders() {
        let mut p = props();
        p.stakeholders
            .push(DecisionStakeholder::new(sid("d1"), StakeholderRole::Informed));
        assert!(matches!(
            Decision::create(p),
            Err(DecisionError::Stakeholder(StakeholderError::AlreadyPresent(_)))
        ));
    }

    #[test]
    fn create_rejects_overlong_title() {
        let mut p = props();
        p.title = "x".repeat(MAX_TITLE_LENGTH + 1);
        assert!(matches!(
            Decision::create(p),
            Err(DecisionError::Validation(ValidationError::TooLong { .. }))
        ));
    }

    #[test]
    fn create_rejects_foreign_relationships() {
        let other = new_decision();
        let mut p = props();
        p.relationships = vec![DecisionRelationship::between(
            &other,
            RelationshipType::Blocks,
            &new_decision(),
            Timestamp::now(),
        )];
        assert!(Decision::create(p).is_err());
    }

    #[test]
    fn create_empty_applies_workflow_defaults() {
        let decision = new_decision();
        assert_eq!(decision.cost(), Cost::Low);
        assert_eq!(decision.reversibility(), Reversibility::Hat);
        assert_eq!(decision.stakeholders().len(), 1);
        assert_eq!(decision.driver_stakeholder_id(), &sid("d1"));
        assert_eq!(decision.title(), "Pick a database");
        assert_eq!(decision.current_step(), WorkflowStep::Identify);
    }

    #[test]
    fn create_empty_generates_distinct_ids() {
        assert_ne!(new_decision().id(), new_decision().id());
    }

    #[test]
    fn serde_round_trip_goes_through_validation() {
        let decision = chosen()
            .add_stakeholder(sid("s2"), StakeholderRole::Consulted)
            .unwrap();
        let json = serde_json::to_string(&decision).unwrap();
        let back: Decision = serde_json::from_str(&json).unwrap();
        assert_eq!(back, decision);

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["driver_stakeholder_id"] = serde_json::json!("nobody");
        assert!(serde_json::from_value::<Decision>(value).is_err());
    }

    #[test]
    fn edits_keep_loaded_version() {
        let decision = new_decision();
        assert!(decision.version().is_initial());

        let edited = decision
            .with(DecisionUpdate::new().title("Pick a queue"))
            .unwrap()
            .add_stakeholder(sid("s2"), StakeholderRole::Informed)
            .unwrap();
        assert_eq!(edited.version(), decision.version());
        assert_eq!(edited.next_version().version().as_u32(), 2);
    }

    #[test]
    fn version_survives_serialization() {
        let stored = new_decision().next_version().next_version();
        let json = serde_json::to_string(&stored).unwrap();
        let back: Decision = serde_json::from_str(&json).unwrap();
        assert_eq!(back.version().as_u32(), 3);

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value.as_object_mut().unwrap().remove("version");
        let legacy: Decision = serde_json::from_value(value).unwrap();
        assert!(legacy.version().is_initial());
    }

    // ───────────────────────────────────────────────────────────────
    // Stakeholders and driver
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn add_stakeholder_appends_in_order() {
        let decision = new_decision()
            .add_stakeholder(sid("s2"), StakeholderRole::default())
            .unwrap()
            .add_stakeholder(sid("s3"), StakeholderRole::Decider)
            .unwrap();
        let ids: Vec<&str> = decision
            .stakeholders()
            .iter()
            .map(|s| s.stakeholder_id.as_str())
            .collect();
        assert_eq!(ids, vec!["d1", "s2", "s3"]);
        assert_eq!(
            decision.stakeholder(&sid("s2")).map(|s| s.role),
            Some(StakeholderRole::Informed)
        );
        assert_eq!(decision.decider_ids(), vec![&sid("s3")]);
    }

    #[test]
    fn add_stakeholder_rejects_duplicates() {
        let decision = new_decision()
            .add_stakeholder(sid("s2"), StakeholderRole::Informed)
            .unwrap();
        assert!(matches!(
            decision.add_stakeholder(sid("s2"), StakeholderRole::Decider),
            Err(DecisionError::Stakeholder(StakeholderError::AlreadyPresent(_)))
        ));
    }

    #[test]
    fn remove_stakeholder_refuses_driver() {
        let decision = new_decision();
        assert!(matches!(
            decision.remove_stakeholder(&sid("d1")),
            Err(DecisionError::Stakeholder(StakeholderError::CannotRemoveDriver(_)))
        ));
    }

    #[test]
    fn remove_stakeholder_filters_entry() {
        let decision = new_decision()
            .add_stakeholder(sid("s2"), StakeholderRole::Informed)
            .unwrap()
            .remove_stakeholder(&sid("s2"))
            .unwrap();
        assert!(!decision.has_stakeholder(&sid("s2")));
        assert!(matches!(
            decision.remove_stakeholder(&sid("s2")),
            Err(DecisionError::Stakeholder(StakeholderError::NotPresent(_)))
        ));
    }

    #[test]
    fn set_stakeholder_role_updates_entry() {
        let decision = new_decision()
            .add_stakeholder(sid("s2"), StakeholderRole::Informed)
            .unwrap()
            .set_stakeholder_role(&sid("s2"), StakeholderRole::Consulted)
            .unwrap();
        assert_eq!(
            decision.stakeholders_with_role(StakeholderRole::Consulted),
            vec![&sid("s2")]
        );
        assert!(decision
            .set_stakeholder_role(&sid("ghost"), StakeholderRole::Decider)
            .is_err());
    }

    #[test]
    fn set_decision_driver_adds_new_and_drops_previous() {
        let decision = new_decision().set_decision_driver(sid("d2")).unwrap();
        assert_eq!(decision.driver_stakeholder_id(), &sid("d2"));
        assert!(decision.has_stakeholder(&sid("d2")));
        assert!(!decision.has_stakeholder(&sid("d1")));
    }

    #[test]
    fn set_decision_driver_keeps_existing_role_of_new_driver() {
        let decision = new_decision()
            .add_stakeholder(sid("s2"), StakeholderRole::Decider)
            .unwrap()
            .set_decision_driver(sid("s2"))
            .unwrap();
        assert_eq!(decision.stakeholders().len(), 1);
        assert_eq!(
            decision.stakeholder(&sid("s2")).map(|s| s.role),
            Some(StakeholderRole::Decider)
        );
    }

    #[test]
    fn set_decision_driver_is_idempotent() {
        let decision = new_decision();
        let same = decision.set_decision_driver(sid("d1")).unwrap();
        assert_eq!(same, decision);
    }

    #[test]
    fn driver_is_always_a_stakeholder() {
        let decision = new_decision()
            .add_stakeholder(sid("s2"), StakeholderRole::Informed)
            .unwrap()
            .set_decision_driver(sid("s3"))
            .unwrap()
            .set_decision_driver(sid("s2"))
            .unwrap();
        assert!(decision.has_stakeholder(decision.driver_stakeholder_id()));
        assert!(decision
            .remove_stakeholder(decision.driver_stakeholder_id())
            .is_err());
    }

    // ───────────────────────────────────────────────────────────────
    // Supporting materials
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn supporting_materials_are_unique_by_url() {
        let material = SupportingMaterial::new("RFC", "https://docs/rfc", "text/html").unwrap();
        let decision = new_decision()
            .add_supporting_material(material.clone())
            .unwrap();
        assert!(matches!(
            decision.add_supporting_material(material),
            Err(DecisionError::DuplicateMaterial(_))
        ));

        let decision = decision.remove_supporting_material("https://docs/rfc").unwrap();
        assert!(decision.supporting_materials().is_empty());
        assert!(matches!(
            decision.remove_supporting_material("https://docs/rfc"),
            Err(DecisionError::MaterialNotFound(_))
        ));
    }

    // ───────────────────────────────────────────────────────────────
    // Updates and publication
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn with_merges_fields_and_refreshes_updated_at() {
        let decision = Decision::create(props()).unwrap();
        let updated = decision
            .with(DecisionUpdate::new().cost(Cost::High).description("Why"))
            .unwrap();
        assert_eq!(updated.cost(), Cost::High);
        assert_eq!(updated.description(), "Why");
        assert_eq!(updated.title(), "Adopt Rust");
        assert!(updated.updated_at().is_after(&decision.updated_at()));
        assert_eq!(decision.cost(), Cost::Medium);
    }

    #[test]
    fn with_rejects_blank_decision() {
        assert!(new_decision()
            .with(DecisionUpdate::new().decision("  "))
            .is_err());
    }

    #[test]
    fn publish_requires_a_chosen_option() {
        assert!(matches!(
            new_decision().publish(),
            Err(DecisionError::State(DecisionStateError::NoOptionChosen(_)))
        ));
    }

    #[test]
    fn publish_sets_publish_date_and_status() {
        let published = chosen().publish().unwrap();
        assert!(published.publish_date().is_some());
        assert_eq!(published.status(), DecisionStatus::Published);
        assert_eq!(published.current_step(), WorkflowStep::Publish);
    }

    #[test]
    fn publish_twice_fails() {
        let published = chosen().publish().unwrap();
        assert!(matches!(
            published.publish(),
            Err(DecisionError::State(DecisionStateError::AlreadyPublished(_)))
        ));
    }

    #[test]
    fn publish_fails_while_blocked() {
        let blocker = new_decision();
        let blocked = chosen().set_relationship(RelationshipType::BlockedBy, &blocker);
        assert_eq!(blocked.status(), DecisionStatus::Blocked);
        assert!(matches!(
            blocked.publish(),
            Err(DecisionError::State(DecisionStateError::Blocked(_)))
        ));
    }

    #[test]
    fn publish_fails_when_superseded() {
        let successor = new_decision();
        let superseded = chosen().set_relationship(RelationshipType::SupersededBy, &successor);
        assert_eq!(superseded.status(), DecisionStatus::Superseded);
        assert!(matches!(
            superseded.publish(),
            Err(DecisionError::State(DecisionStateError::Superseded(_)))
        ));
    }

    #[test]
    fn published_decision_rejects_direct_edits() {
        let published = chosen().publish().unwrap();
        let immutable = |r: Result<Decision, DecisionError>| {
            matches!(r, Err(DecisionError::State(DecisionStateError::Immutable(_))))
        };
        assert!(immutable(published.with(DecisionUpdate::new().title("Changed"))));
        assert!(immutable(published.with(DecisionUpdate::new())));
        assert!(immutable(
            published.add_stakeholder(sid("s9"), StakeholderRole::Informed)
        ));
        assert!(immutable(published.set_decision_driver(sid("s9"))));
    }

    #[test]
    fn published_decision_can_still_be_superseded() {
        let published = chosen().publish().unwrap();
        let successor = new_decision();
        let superseded = published.set_relationship(RelationshipType::SupersededBy, &successor);
        assert_eq!(superseded.status(), DecisionStatus::Superseded);
        assert_eq!(superseded.current_step(), WorkflowStep::Publish);
    }

    // ───────────────────────────────────────────────────────────────
    // Derived workflow step
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn current_step_follows_workflow() {
        let decision = Decision::create_empty(org(), sid("d1"), DecisionUpdate::new()).unwrap();
        assert_eq!(decision.current_step(), WorkflowStep::Identify);

        let decision = decision
            .add_stakeholder(sid("s2"), StakeholderRole::default())
            .unwrap();
        assert_eq!(decision.current_step(), WorkflowStep::Stakeholders);

        let decision = decision
            .with(DecisionUpdate::new().decision_method(DecisionMethod::Consent))
            .unwrap();
        assert_eq!(decision.current_step(), WorkflowStep::Method);

        let decision = decision
            .with(DecisionUpdate::new().decision("Option A"))
            .unwrap();
        assert_eq!(decision.current_step(), WorkflowStep::Choose);

        let decision = decision.publish().unwrap();
        assert_eq!(decision.current_step(), WorkflowStep::Publish);
        assert_eq!(decision.status(), DecisionStatus::Published);
    }

    #[test]
    fn clearing_choice_and_method_moves_step_back() {
        let decision = new_decision()
            .add_stakeholder(sid("s2"), StakeholderRole::default())
            .unwrap()
            .with(
                DecisionUpdate::new()
                    .decision_method(DecisionMethod::Consent)
                    .decision("Option A"),
            )
            .unwrap();
        assert_eq!(decision.current_step(), WorkflowStep::Choose);

        let decision = decision.with(DecisionUpdate::new().clear_decision()).unwrap();
        assert!(decision.decision().is_none());
        assert_eq!(decision.current_step(), WorkflowStep::Method);
        assert!(decision.publish().is_err());

        let decision = decision
            .with(DecisionUpdate::new().clear_decision_method())
            .unwrap();
        assert!(decision.decision_method().is_none());
        assert_eq!(decision.current_step(), WorkflowStep::Stakeholders);
    }

    #[test]
    fn current_step_regresses_when_stakeholders_removed() {
        let decision = new_decision()
            .add_stakeholder(sid("s2"), StakeholderRole::default())
            .unwrap();
        assert_eq!(decision.current_step(), WorkflowStep::Stakeholders);
        let decision = decision.remove_stakeholder(&sid("s2")).unwrap();
        assert_eq!(decision.current_step(), WorkflowStep::Identify);
    }

    // ───────────────────────────────────────────────────────────────
    // Relationship map
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn set_and_unset_relationship_touch_only_local_map() {
        let a = new_decision();
        let b = new_decision();
        let a2 = a.set_relationship(RelationshipType::Blocks, &b);

        assert_eq!(a2.relationships_by_type(RelationshipType::Blocks).len(), 1);
        assert!(a2.relationship(RelationshipType::Blocks, b.id()).is_some());
        assert!(b.relationships().next().is_none());

        let a3 = a2.unset_relationship(RelationshipType::Blocks, b.id());
        assert!(a3.relationships().next().is_none());
    }

    #[test]
    fn unset_missing_relationship_is_a_no_op() {
        let a = new_decision();
        let b = new_decision();
        assert_eq!(a.unset_relationship(RelationshipType::Blocks, b.id()), a);
    }
}
