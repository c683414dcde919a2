//! EventSubscriber port - Interface for reacting to domain events.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Handler for processing domain events.
///
/// Handlers should be idempotent; the same envelope may arrive twice.
///
/// ```ignore
/// struct UnblockNotifier;
///
/// #[async_trait]
/// impl EventHandler for UnblockNotifier {
///     async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
///         let published: DecisionPublishedEvent = event.payload_as()?;
///         // notify the drivers of published.unblocked_decision_ids
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "UnblockNotifier"
///     }
/// }
/// ```
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Port for subscribing to domain events by type.
pub trait EventSubscriber: Send + Sync {
    /// Invoke `handler` for every event of `event_type`.
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>);

    /// Invoke the same `handler` for each of `event_types`.
    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>);
}

/// Combined publishing and subscribing.
pub trait EventBus: super::EventPublisher + EventSubscriber {}

impl<T: super::EventPublisher + EventSubscriber> EventBus for T {}
