use async_trait::async_trait;
use events::DomainEvent;

use crate::error::BusError;

/// Name of the durable topic exchange every event flows through.
pub const EVENT_EXCHANGE: &str = "order-processing-events";

/// Publish seam between a service and the broker.
///
/// Delivery is at-least-once: a publish that succeeds at the transport layer
/// is not transactionally tied to the caller's local state mutation. If the
/// process crashes between mutating state and publishing, the event is lost;
/// there is deliberately no outbox here.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes an event to the topic exchange under its routing key
    /// (`event.<lowercase event type>`).
    async fn publish(&self, event: &DomainEvent) -> Result<(), BusError>;
}
