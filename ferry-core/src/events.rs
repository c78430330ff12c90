use async_trait::async_trait;
use ferry_shared::models::events::FerryEvent;

/// Outbound notification of booking and fleet changes. Publishing is
/// best-effort: a lost event never rolls back the state change behind it.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: FerryEvent);
}

/// Drops every event. Used where nobody listens, e.g. in tests.
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, event: FerryEvent) {
        tracing::trace!("Dropping event {}", event.name());
    }
}
