//! Command infrastructure for application handlers.
//!
//! `CommandMetadata` is the context that flows from the calling layer through
//! a handler into the events it publishes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StakeholderId;

/// Metadata context for command handlers.
///
/// Carries correlation and actor context through command processing.
/// Handlers propagate it to every emitted event envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// The person executing this command.
    pub actor_id: StakeholderId,

    /// Links related operations across a single user request.
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,

    /// Source of this command (e.g., "web", "admin-script").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CommandMetadata {
    /// Creates new command metadata for the given actor.
    pub fn new(actor_id: StakeholderId) -> Self {
        Self {
            actor_id,
            correlation_id: None,
            source: None,
        }
    }

    /// Builder: Add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builder: Add source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the correlation ID, generating one if absent.
    ///
    /// Freshly generated IDs are not stored; call `ensure_correlation_id`
    /// first when several events must share one.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// Fills in a correlation ID if none was provided.
    pub fn ensure_correlation_id(mut self) -> Self {
        if self.correlation_id.is_none() {
            self.correlation_id = Some(Uuid::new_v4().to_string());
        }
        self
    }

    /// Returns the command source, if any.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}
