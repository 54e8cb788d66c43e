//! Typed access to the order's event-store log.

use std::sync::Arc;

use common::OrderId;
use event_store::{EventRecord, EventStore, EventStoreExt, StoredEvent, Version};
use tracing::warn;

use events::DomainEvent;

use crate::OrderError;

/// Appends integration events to the per-order log and reads them back
/// decoded. The order id is the aggregate id.
#[derive(Clone)]
pub struct OrderEventLog {
    store: Arc<dyn EventStore>,
}

impl OrderEventLog {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Appends one event to its order's log, retrying version conflicts.
    pub async fn append(&self, event: &DomainEvent) -> Result<Version, OrderError> {
        let record = EventRecord::new(
            event.event_id(),
            event.event_type(),
            serde_json::to_value(event)?,
            event.occurred_at(),
        );
        let version = self
            .store
            .append_with_retry(event.order_id().into(), record)
            .await?;
        Ok(version)
    }

    /// Returns the order's history decoded into typed events, in version
    /// order. Entries with an unknown type tag are skipped, not fatal, so a
    /// log written by a newer deployment stays readable.
    pub async fn history(&self, order_id: OrderId) -> Result<Vec<DomainEvent>, OrderError> {
        let stored = self.store.load(order_id.into()).await?;
        Ok(stored
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry.payload) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(
                        event_type = %entry.event_type,
                        version = %entry.version,
                        error = %e,
                        "skipping undecodable event in history"
                    );
                    None
                }
            })
            .collect())
    }

    /// Returns the raw stored entries (with versions) for audit endpoints.
    pub async fn raw_history(&self, order_id: OrderId) -> Result<Vec<StoredEvent>, OrderError> {
        Ok(self.store.load(order_id.into()).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{CustomerId, EventId, Money};
    use event_store::{InMemoryEventStore, verify_gapless};

    use super::*;

    fn log() -> (OrderEventLog, Arc<InMemoryEventStore>) {
        let store = Arc::new(InMemoryEventStore::new());
        (OrderEventLog::new(store.clone()), store)
    }

    #[tokio::test]
    async fn appends_are_versioned_one_to_n() {
        let (log, _) = log();
        let order_id = OrderId::new();

        let v1 = log
            .append(&DomainEvent::order_placed(
                order_id,
                CustomerId::new(),
                vec![],
                Money::zero(),
            ))
            .await
            .unwrap();
        let v2 = log
            .append(&DomainEvent::order_confirmed(order_id))
            .await
            .unwrap();

        assert_eq!(v1, Version::new(1));
        assert_eq!(v2, Version::new(2));

        let raw = log.raw_history(order_id).await.unwrap();
        verify_gapless(&raw).unwrap();
    }

    #[tokio::test]
    async fn history_decodes_in_version_order() {
        let (log, _) = log();
        let order_id = OrderId::new();

        log.append(&DomainEvent::order_placed(
            order_id,
            CustomerId::new(),
            vec![],
            Money::zero(),
        ))
        .await
        .unwrap();
        log.append(&DomainEvent::order_cancelled(order_id, "no stock"))
            .await
            .unwrap();

        let history = log.history(order_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].event_type(), "OrderPlaced");
        assert_eq!(history[1].event_type(), "OrderCancelled");
    }

    #[tokio::test]
    async fn unknown_event_types_are_skipped_not_fatal() {
        let (log, store) = log();
        let order_id = OrderId::new();

        log.append(&DomainEvent::order_placed(
            order_id,
            CustomerId::new(),
            vec![],
            Money::zero(),
        ))
        .await
        .unwrap();

        // An event type from some future deployment.
        store
            .append(
                order_id.into(),
                EventRecord::new(
                    EventId::new(),
                    "OrderShipped",
                    serde_json::json!({"event_type": "OrderShipped", "order_id": order_id}),
                    Utc::now(),
                ),
            )
            .await
            .unwrap();

        let history = log.history(order_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event_type(), "OrderPlaced");

        // The raw log still shows both entries.
        assert_eq!(log.raw_history(order_id).await.unwrap().len(), 2);
    }
}
