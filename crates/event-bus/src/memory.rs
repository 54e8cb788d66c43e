//! In-process bus with broker-equivalent routing semantics.

use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tracing::{debug, warn};

use events::DomainEvent;

use crate::{
    bus::EventBus,
    consumer::EventConsumer,
    dedup::{EventDeduplicator, InMemoryEventDeduplicator},
    error::BusError,
    topic::topic_matches,
};

struct Binding {
    queue: String,
    routing_keys: Vec<String>,
    consumer: Arc<dyn EventConsumer>,
}

/// Topic bus that dispatches inline, without a broker.
///
/// Routing mirrors the AMQP exchange: an event is delivered at most once per
/// bound queue whose patterns match the routing key, after consulting the
/// deduplicator. Handler failures are logged and dropped, the in-process
/// analogue of reject-without-requeue. Every published event is also
/// recorded so tests can assert on the emitted chain.
pub struct InMemoryEventBus {
    bindings: RwLock<Vec<Binding>>,
    published: Mutex<Vec<DomainEvent>>,
    dedup: Arc<dyn EventDeduplicator>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::with_deduplicator(Arc::new(InMemoryEventDeduplicator::new()))
    }

    pub fn with_deduplicator(dedup: Arc<dyn EventDeduplicator>) -> Self {
        Self {
            bindings: RwLock::new(Vec::new()),
            published: Mutex::new(Vec::new()),
            dedup,
        }
    }

    /// Binds a consumer's queue to its routing-key patterns.
    pub fn bind(&self, consumer: Arc<dyn EventConsumer>) {
        let binding = Binding {
            queue: consumer.queue_name().to_string(),
            routing_keys: consumer
                .routing_keys()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            consumer,
        };
        self.bindings.write().unwrap().push(binding);
    }

    /// Returns every event published so far, in publish order.
    pub fn published(&self) -> Vec<DomainEvent> {
        self.published.lock().unwrap().clone()
    }

    /// Returns how many events of the given type were published.
    pub fn published_count(&self, event_type: &str) -> usize {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: &DomainEvent) -> Result<(), BusError> {
        self.published.lock().unwrap().push(event.clone());
        metrics::counter!("events_published_total").increment(1);

        let routing_key = event.routing_key();

        // Snapshot matching bindings before dispatching so a handler that
        // publishes (and recurses into this method) never re-enters the lock.
        let matching: Vec<(String, Arc<dyn EventConsumer>)> = self
            .bindings
            .read()
            .unwrap()
            .iter()
            .filter(|b| b.routing_keys.iter().any(|p| topic_matches(p, &routing_key)))
            .map(|b| (b.queue.clone(), b.consumer.clone()))
            .collect();

        for (queue, consumer) in matching {
            let event_id = event.event_id();
            if self.dedup.already_processed(&queue, event_id).await {
                debug!(queue = %queue, %event_id, "skipping duplicate delivery");
                continue;
            }
            match consumer.handle(event.clone()).await {
                Ok(()) => {
                    self.dedup.mark_processed(&queue, event_id).await;
                    metrics::counter!("events_consumed_total").increment(1);
                }
                Err(e) => {
                    warn!(
                        queue = %queue,
                        event_type = event.event_type(),
                        error = %e,
                        "handler failed, dropping event"
                    );
                    metrics::counter!("events_dropped_total").increment(1);
                }
            }
        }

        Ok(())
    }
}
