//! Stored revision counter for optimistic locking.

use serde::{Deserialize, Serialize};

/// Revision of a stored document.
///
/// A value carries the version it was loaded at. Repositories accept a
/// write only while the stored copy still has that version, and store the
/// written value one version higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Version(u32);

impl Version {
    /// Version of a document that has never been replaced (1).
    pub fn initial() -> Self {
        Self(1)
    }

    pub fn from_u32(value: u32) -> Result<Self, &'static str> {
        if value == 0 {
            Err("Version must be greater than 0")
        } else {
            Ok(Self(value))
        }
    }

    pub fn increment(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn is_initial(&self) -> bool {
        self.0 == 1
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Column form for PostgreSQL `BIGINT`.
    pub fn as_i64(&self) -> i64 {
        i64::from(self.0)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::initial()
    }
}

impl TryFrom<u32> for Version {
    type Error = &'static str;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_u32(value)
    }
}

impl From<Version> for u32 {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
