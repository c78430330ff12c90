use async_trait::async_trait;
use ferry_core::events::EventPublisher;
use ferry_shared::models::events::FerryEvent;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Fans ferry events out to in-process subscribers (SSE streams, workers).
#[derive(Clone)]
pub struct EventProducer {
    sender: broadcast::Sender<FerryEvent>,
}

impl EventProducer {
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FerryEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventPublisher for EventProducer {
    async fn publish(&self, event: FerryEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => info!("Published {} to {} subscriber(s)", name, receivers),
            Err(_) => debug!("No subscribers for {}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_shared::models::events::OccupancyChangedEvent;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let producer = EventProducer::new(8);
        let mut rx = producer.subscribe();
        let ferry_id = Uuid::new_v4();

        producer
            .publish(FerryEvent::OccupancyChanged(OccupancyChangedEvent {
                ferry_id,
                capacity: 4,
                occupied: 1,
                remaining: 3,
                timestamp: 0,
            }))
            .await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.ferry_id(), Some(ferry_id));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let producer = EventProducer::new(1);
        producer
            .publish(FerryEvent::OccupancyChanged(OccupancyChangedEvent {
                ferry_id: Uuid::new_v4(),
                capacity: 1,
                occupied: 0,
                remaining: 1,
                timestamp: 0,
            }))
            .await;
    }
}
