//! Typed event channel
//!
//! Births and non-fatal errors fan out to every subscriber through a tokio
//! broadcast channel. Slow subscribers lag and lose the oldest events.

use tokio::sync::broadcast;

use super::types::MintEvent;

/// Publisher side of the event stream
#[derive(Clone)]
pub struct MintEventPublisher {
    sender: broadcast::Sender<MintEvent>,
}

impl MintEventPublisher {
    /// Create a publisher with the given buffer capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<MintEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: MintEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MintEventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let publisher = MintEventPublisher::new(8);
        let mut rx1 = publisher.subscribe();
        let mut rx2 = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 2);

        publisher.publish(MintEvent::error("rpc down"));

        assert_eq!(rx1.recv().await.unwrap(), MintEvent::error("rpc down"));
        assert_eq!(rx2.recv().await.unwrap(), MintEvent::error("rpc down"));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let publisher = MintEventPublisher::default();
        publisher.publish(MintEvent::error("nobody listening"));
        assert_eq!(publisher.subscriber_count(), 0);
    }
}
