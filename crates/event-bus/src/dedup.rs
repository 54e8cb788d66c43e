//! Idempotency store for at-least-once delivery.
//!
//! The broker may deliver the same event more than once; before a handler
//! runs, the runtime asks this store whether the `(consumer, event_id)` pair
//! has already been processed. An event is marked only after its handler
//! succeeded, so a failed handling can still be completed by a later
//! redelivery.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use common::EventId;

/// Records which event ids a consumer has fully processed.
#[async_trait]
pub trait EventDeduplicator: Send + Sync {
    /// Returns true if this consumer already processed the event.
    async fn already_processed(&self, consumer: &str, event_id: EventId) -> bool;

    /// Marks the event as processed by this consumer.
    async fn mark_processed(&self, consumer: &str, event_id: EventId);
}

/// In-memory deduplicator. Per-process only; a restart forgets everything,
/// which is acceptable for at-least-once consumers whose handlers are
/// additionally idempotent (e.g. release of a reservation).
#[derive(Default)]
pub struct InMemoryEventDeduplicator {
    seen: Mutex<HashSet<(String, EventId)>>,
}

impl InMemoryEventDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of recorded deliveries.
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventDeduplicator for InMemoryEventDeduplicator {
    async fn already_processed(&self, consumer: &str, event_id: EventId) -> bool {
        self.seen
            .lock()
            .unwrap()
            .contains(&(consumer.to_string(), event_id))
    }

    async fn mark_processed(&self, consumer: &str, event_id: EventId) {
        self.seen
            .lock()
            .unwrap()
            .insert((consumer.to_string(), event_id));
    }
}
