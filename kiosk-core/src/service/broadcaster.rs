use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::models::ChangeEvent;

/// Handle identifying one change stream connection
pub type SubscriptionId = String;

/// Mailbox size per subscriber
pub const DEFAULT_MAILBOX_CAPACITY: usize = 32;

struct Registry {
    subscribers: DashMap<SubscriptionId, mpsc::Sender<ChangeEvent>>,
    capacity: usize,
}

impl Registry {
    fn remove(&self, id: &str) -> bool {
        self.subscribers.remove(id).is_some()
    }
}

/// In-process publish/subscribe hub for content change notifications
///
/// Every subscriber owns a bounded mailbox. Publishing never waits on a
/// subscriber: a full mailbox simply misses the event.
#[derive(Clone)]
pub struct ChangeBroadcaster {
    registry: Arc<Registry>,
}

impl ChangeBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAILBOX_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry {
                subscribers: DashMap::new(),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Register a new subscriber; dropping the returned handle unregisters it
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.registry.capacity);
        let id: SubscriptionId = nanoid::nanoid!(12);
        self.registry.subscribers.insert(id.clone(), tx);

        info!(
            subscription_id = %id,
            subscribers = self.registry.subscribers.len(),
            "Change stream subscriber registered"
        );

        Subscription {
            id,
            receiver: rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `event` to every current subscriber, returning how many received it
    pub fn publish(&self, event: ChangeEvent) -> usize {
        // Snapshot so no shard lock is held while sending
        let targets: Vec<(SubscriptionId, mpsc::Sender<ChangeEvent>)> = self
            .registry
            .subscribers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut sent_count = 0;
        let mut closed = Vec::new();

        for (id, sender) in targets {
            match sender.try_send(event.clone()) {
                Ok(()) => sent_count += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        subscription_id = %id,
                        event_type = %event.event_type(),
                        "Subscriber mailbox full, dropping event"
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(id),
            }
        }

        for id in closed {
            if self.registry.remove(&id) {
                debug!(subscription_id = %id, "Pruned closed subscriber");
            }
        }

        debug!(
            event_type = %event.event_type(),
            sent_count = sent_count,
            "Change event published"
        );

        sent_count
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.subscribers.len()
    }
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// One registered mailbox
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<ChangeEvent>,
    registry: Weak<Registry>,
}

impl Subscription {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Next event in publish order
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }

    /// Wait at most `wait` for the next event
    ///
    /// `Err` means the wait elapsed, `Ok(None)` that the hub is gone.
    pub async fn recv_timeout(
        &mut self,
        wait: Duration,
    ) -> Result<Option<ChangeEvent>, tokio::time::error::Elapsed> {
        tokio::time::timeout(wait, self.receiver.recv()).await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if registry.remove(&self.id) {
                info!(
                    subscription_id = %self.id,
                    subscribers = registry.subscribers.len(),
                    "Change stream subscriber unregistered"
                );
            }
        }
    }
}
