//! In-process change bus.
//!
//! Wraps a bounded `tokio::sync::broadcast` channel. Publishing never blocks;
//! observers that fall behind lose events and are told to resync instead.
//!
//! ```text
//! QueueEngine mutation
//!        |
//!        v
//! BroadcastNotifier::publish
//!        |
//!        v
//! broadcast::Sender<QueueChangeEvent>
//!        |
//!        v
//! ChangeSubscription (filtered per service / origin) -> re-query
//! ```

use crate::domain::QueueChangeEvent;
use crate::port::ChangeNotifier;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// Buffer size for the change broadcast channel.
pub const CHANGE_EVENT_BUFFER_SIZE: usize = 256;

/// What an observer receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A queue it watches changed; re-query it
    Changed(QueueChangeEvent),
    /// The observer fell behind and missed `missed` events; re-query everything
    Resync { missed: u64 },
}

/// Which events a subscription cares about
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    service_id: Option<String>,
    ignore_origin: Option<String>,
}

impl SubscriptionFilter {
    /// Every service, every origin
    pub fn all() -> Self {
        Self::default()
    }

    pub fn service(service_id: impl Into<String>) -> Self {
        Self {
            service_id: Some(service_id.into()),
            ignore_origin: None,
        }
    }

    /// Drop events written by `origin` (the subscriber's own engine)
    pub fn excluding_origin(mut self, origin: impl Into<String>) -> Self {
        self.ignore_origin = Some(origin.into());
        self
    }

    fn matches(&self, event: &QueueChangeEvent) -> bool {
        if let Some(service_id) = &self.service_id {
            if &event.service_id != service_id {
                return false;
            }
        }
        if let Some(origin) = &self.ignore_origin {
            if &event.origin == origin {
                return false;
            }
        }
        true
    }
}

/// Broadcaster for queue change events.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<QueueChangeEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self, filter: SubscriptionFilter) -> ChangeSubscription {
        ChangeSubscription {
            receiver: self.sender.subscribe(),
            filter,
        }
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(CHANGE_EVENT_BUFFER_SIZE)
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn publish(&self, event: QueueChangeEvent) {
        let key = event.key();
        match self.sender.send(event) {
            Ok(observers) => debug!(key = %key, observers, "Published queue change"),
            // No observers is normal
            Err(_) => trace!(key = %key, "Queue change published with no observers"),
        }
    }
}

/// One observer's view of the bus
pub struct ChangeSubscription {
    receiver: broadcast::Receiver<QueueChangeEvent>,
    filter: SubscriptionFilter,
}

impl ChangeSubscription {
    /// Next matching notification, or None once the bus is gone
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => {
                    return Some(Notification::Changed(event))
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Change observer lagged, forcing resync");
                    return Some(Notification::Resync { missed });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
