use async_trait::async_trait;
use tracing::debug;

use event_bus::{EventConsumer, HandlerResult};
use events::DomainEvent;

use crate::AnalyticsStore;

/// Consumes every event on the exchange via the `event.*` wildcard binding.
pub struct AllEventsConsumer {
    store: AnalyticsStore,
}

impl AllEventsConsumer {
    pub fn new(store: AnalyticsStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventConsumer for AllEventsConsumer {
    fn queue_name(&self) -> &str {
        "analytics-service-events"
    }

    fn routing_keys(&self) -> &[&str] {
        &["event.*"]
    }

    async fn handle(&self, event: DomainEvent) -> HandlerResult {
        debug!(
            event_type = event.event_type(),
            order_id = %event.order_id(),
            "event logged"
        );
        self.store.apply(&event);
        Ok(())
    }
}
