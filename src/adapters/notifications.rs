//! Change broadcasting shared by the repository adapters.

use tokio::sync::broadcast;

use crate::domain::foundation::{DecisionId, OrganisationId};
use crate::ports::{DecisionChange, DecisionSubscription};

/// Fan-out of committed decision changes to every subscriber.
///
/// Cloning shares the same channel.
#[derive(Clone)]
pub struct ChangeBroadcaster {
    sender: broadcast::Sender<DecisionChange>,
}

impl ChangeBroadcaster {
    /// `capacity` is the number of changes buffered per slow subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Announces committed changes, in order.
    pub fn notify(&self, changes: impl IntoIterator<Item = DecisionChange>) {
        for change in changes {
            // No receivers is fine: nobody is watching yet.
            let _ = self.sender.send(change);
        }
    }

    pub fn subscribe(
        &self,
        organisation_id: &OrganisationId,
        decision_id: Option<&DecisionId>,
    ) -> DecisionSubscription {
        DecisionSubscription::new(
            self.sender.subscribe(),
            organisation_id.clone(),
            decision_id.cloned(),
        )
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
