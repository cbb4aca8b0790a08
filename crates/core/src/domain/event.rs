// Queue change events
//
// Signals only: an event names the queue that changed and never carries queue
// data. Observers re-query after receiving one.

use serde::{Deserialize, Serialize};

/// Prefix of the per-service queue key
pub const QUEUE_KEY_PREFIX: &str = "queue_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    QueueChanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueChangeEvent {
    pub service_id: String,
    pub kind: ChangeKind,
    /// Engine instance that performed the write
    pub origin: String,
}

impl QueueChangeEvent {
    pub fn queue_changed(service_id: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            kind: ChangeKind::QueueChanged,
            origin: origin.into(),
        }
    }

    /// Storage key of the queue that changed
    pub fn key(&self) -> String {
        queue_key(&self.service_id)
    }
}

pub fn queue_key(service_id: &str) -> String {
    format!("{}{}", QUEUE_KEY_PREFIX, service_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_key_and_kind() {
        let event = QueueChangeEvent::queue_changed("mens-mess-1", "engine-a");
        assert_eq!(event.key(), "queue_mens-mess-1");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "queue-changed");
    }
}
