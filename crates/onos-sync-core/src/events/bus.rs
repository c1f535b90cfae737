//! Event bus for lifecycle notifications.
//!
//! Thin wrapper over a tokio broadcast channel so publishers and the
//! invalidator do not share anything but the bus handle.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::BusMessage;

/// Default buffer size for the broadcast channel.
/// Slow receivers lose the oldest messages beyond this limit.
const DEFAULT_BUFFER_SIZE: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusMessage>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Publish a message, returning how many subscribers received it.
    pub fn publish(&self, message: BusMessage) -> usize {
        self.sender.send(message).unwrap_or_default()
    }

    pub fn publish_payload(&self, topic: impl Into<String>, payload: impl Into<String>) -> usize {
        self.publish(BusMessage::new(topic, payload))
    }

    /// Messages published before subscribing are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::POD_DETAILS_TOPIC;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish_payload(POD_DETAILS_TOPIC, "{}"), 0);
    }

    #[tokio::test]
    async fn test_publish_receive() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        assert_eq!(bus.publish_payload(POD_DETAILS_TOPIC, r#"{"status":"created"}"#), 1);

        let message = receiver.recv().await.unwrap();
        assert_eq!(message.topic, POD_DETAILS_TOPIC);
        assert!(message.payload.contains("created"));
    }

    #[test]
    fn test_shared_bus_counts_subscribers() {
        let bus = EventBus::new_shared();
        let other = bus.clone();
        let _receiver = bus.subscribe();
        assert_eq!(other.subscriber_count(), 1);
    }
}
