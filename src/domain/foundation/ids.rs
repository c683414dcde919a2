//! Strongly-typed identifier value objects.
//!
//! Identifiers are opaque non-empty strings. Decision ids are generated as
//! UUID v4 strings; organisation, team, project and stakeholder ids come
//! from the surrounding system and are accepted as-is.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier, returning error if empty.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                Ok(Self(id))
            }

            /// Returns the inner string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

string_id!(
    /// Unique identifier for a decision.
    DecisionId,
    "decision_id"
);

string_id!(
    /// Tenancy anchor shared by every decision, relationship and team tree.
    OrganisationId,
    "organisation_id"
);

string_id!(
    /// Identifier of a person taking part in a decision.
    StakeholderId,
    "stakeholder_id"
);

string_id!(
    /// Identifier of a team within an organisation.
    TeamId,
    "team_id"
);

string_id!(
    /// Identifier of a project within an organisation.
    ProjectId,
    "project_id"
);

impl DecisionId {
    /// Creates a new random DecisionId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}
