//! Value objects describing a decision.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{StakeholderId, ValidationError};

/// Rough cost of getting the decision wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Cost {
    #[default]
    Low,
    Medium,
    High,
}

/// How hard a decision is to undo.
///
/// A hat is easily swapped, a haircut grows back, a tattoo is permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Reversibility {
    #[default]
    Hat,
    Haircut,
    Tattoo,
}

/// Involvement level of a stakeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StakeholderRole {
    Decider,
    Consulted,
    #[default]
    Informed,
}

impl fmt::Display for StakeholderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StakeholderRole::Decider => "decider",
            StakeholderRole::Consulted => "consulted",
            StakeholderRole::Informed => "informed",
        };
        write!(f, "{}", s)
    }
}

/// How the decision gets made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMethod {
    AccountableIndividual,
    Consent,
}

/// A stakeholder taking part in a decision, with their role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionStakeholder {
    pub stakeholder_id: StakeholderId,
    pub role: StakeholderRole,
}

impl DecisionStakeholder {
    pub fn new(stakeholder_id: StakeholderId, role: StakeholderRole) -> Self {
        Self {
            stakeholder_id,
            role,
        }
    }
}

/// A document or link backing the decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupportingMaterial {
    title: String,
    url: String,
    mime_type: String,
}

impl SupportingMaterial {
    /// Creates a supporting material entry; title and url are required.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let url = url.into();
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("supporting_material.title"));
        }
        if url.trim().is_empty() {
            return Err(ValidationError::empty_field("supporting_material.url"));
        }
        Ok(Self {
            title,
            url,
            mime_type: mime_type.into(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_new_decision_defaults() {
        assert_eq!(Cost::default(), Cost::Low);
        assert_eq!(Reversibility::default(), Reversibility::Hat);
        assert_eq!(StakeholderRole::default(), StakeholderRole::Informed);
    }

    #[test]
    fn enums_serialize_to_snake_case() {
        assert_eq!(
            serde_json::to_string(&DecisionMethod::AccountableIndividual).unwrap(),
            "\"accountable_individual\""
        );
        assert_eq!(serde_json::to_string(&Reversibility::Tattoo).unwrap(), "\"tattoo\"");
        let role: StakeholderRole = serde_json::from_str("\"consulted\"").unwrap();
        assert_eq!(role, StakeholderRole::Consulted);
    }

    #[test]
    fn supporting_material_requires_title_and_url() {
        assert!(SupportingMaterial::new("", "https://x", "text/html").is_err());
        assert!(SupportingMaterial::new("Spec", " ", "text/html").is_err());

        let material = SupportingMaterial::new("Spec", "https://docs/spec", "text/html").unwrap();
        assert_eq!(material.title(), "Spec");
        assert_eq!(material.url(), "https://docs/spec");
        assert_eq!(material.mime_type(), "text/html");
    }
}
