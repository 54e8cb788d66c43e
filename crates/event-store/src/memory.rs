use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use tokio::sync::RwLock;

use crate::{EventRecord, Result, StoredEvent, Version, store::EventStore};

/// In-memory event store for tests and the reference runtime.
///
/// Appends run under an exclusive write lock, which plays the role of the
/// database uniqueness constraint: the read-compute-insert of the next
/// version is a single critical section, so versions per aggregate are
/// always a gapless `1..N` sequence.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Clears all events.
    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, aggregate_id: AggregateId, record: EventRecord) -> Result<Version> {
        let mut events = self.events.write().await;

        let version = events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max()
            .unwrap_or(Version::initial())
            .next();

        events.push(StoredEvent {
            event_id: record.event_id,
            aggregate_id,
            event_type: record.event_type,
            version,
            occurred_at: record.occurred_at,
            payload: record.payload,
        });

        metrics::counter!("event_store_appends_total").increment(1);
        Ok(version)
    }

    async fn load(&self, aggregate_id: AggregateId) -> Result<Vec<StoredEvent>> {
        let events = self.events.read().await;
        let mut history: Vec<_> = events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        history.sort_by_key(|e| e.version);
        Ok(history)
    }

    async fn current_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::EventId;

    use super::*;
    use crate::store::verify_gapless;

    fn record(event_type: &str) -> EventRecord {
        EventRecord::new(
            EventId::new(),
            event_type,
            serde_json::json!({"test": true}),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn append_assigns_sequential_versions() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let v1 = store.append(aggregate_id, record("Event1")).await.unwrap();
        let v2 = store.append(aggregate_id, record("Event2")).await.unwrap();
        let v3 = store.append(aggregate_id, record("Event3")).await.unwrap();

        assert_eq!(v1, Version::new(1));
        assert_eq!(v2, Version::new(2));
        assert_eq!(v3, Version::new(3));
    }

    #[tokio::test]
    async fn load_returns_version_order_with_no_gaps() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        for i in 0..5 {
            store
                .append(aggregate_id, record(&format!("Event{i}")))
                .await
                .unwrap();
        }

        let history = store.load(aggregate_id).await.unwrap();
        assert_eq!(history.len(), 5);
        verify_gapless(&history).unwrap();
        assert_eq!(history[0].event_type, "Event0");
        assert_eq!(history[4].event_type, "Event4");
    }

    #[tokio::test]
    async fn aggregates_do_not_share_versions() {
        let store = InMemoryEventStore::new();
        let a = AggregateId::new();
        let b = AggregateId::new();

        store.append(a, record("EventA")).await.unwrap();
        store.append(a, record("EventA")).await.unwrap();
        let vb = store.append(b, record("EventB")).await.unwrap();

        assert_eq!(vb, Version::first());
        assert_eq!(store.current_version(a).await.unwrap(), Some(Version::new(2)));
        assert_eq!(store.current_version(b).await.unwrap(), Some(Version::new(1)));
    }

    #[tokio::test]
    async fn current_version_is_none_for_unknown_aggregate() {
        let store = InMemoryEventStore::new();
        let version = store.current_version(AggregateId::new()).await.unwrap();
        assert!(version.is_none());
    }

    #[tokio::test]
    async fn concurrent_appends_stay_gapless() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append(aggregate_id, record(&format!("Event{i}")))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let history = store.load(aggregate_id).await.unwrap();
        assert_eq!(history.len(), 10);
        verify_gapless(&history).unwrap();
    }
}
