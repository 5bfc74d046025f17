use crate::events::ListenerEvent;
use tokio::sync::broadcast;

/// Broadcast publisher for listener lifecycle events
///
/// ```rust
/// use dispatchq::EventPublisher;
///
/// # tokio_test::block_on(async {
/// let publisher = EventPublisher::new(16);
/// let _events = publisher.subscribe();
/// assert_eq!(publisher.subscriber_count(), 1);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<ListenerEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers
    pub fn publish(&self, event: ListenerEvent) {
        // send() returns an error only when there are no subscribers, which
        // is acceptable for lifecycle notifications
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<ListenerEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobRequest, ProcessingRequest};

    fn request() -> ProcessingRequest {
        ProcessingRequest {
            job_id: "m-1".to_string(),
            name: "work".to_string(),
            queue_id: "work".to_string(),
            queue_name: "Work".to_string(),
            job_request: JobRequest::new("Work", None),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let publisher = EventPublisher::default();
        let mut subscriber = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 1);

        publisher.publish(ListenerEvent::ProcessingCompleted {
            request: request(),
            result_body: Some("done".to_string()),
        });

        match subscriber.recv().await.unwrap() {
            ListenerEvent::ProcessingCompleted { result_body, .. } => {
                assert_eq!(result_body.as_deref(), Some("done"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let publisher = EventPublisher::default();
        publisher.publish(ListenerEvent::ProcessingFailed {
            request: request(),
            error: "boom".to_string(),
        });
    }
}
