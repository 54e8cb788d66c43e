use async_trait::async_trait;
use common::AggregateId;

use crate::{EventRecord, EventStoreError, Result, StoredEvent, Version};

/// How many times [`EventStoreExt::append_with_retry`] re-attempts an append
/// after a version conflict before giving up.
const APPEND_RETRY_ATTEMPTS: u32 = 3;

/// Core trait for event store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a single event to the aggregate's log.
    ///
    /// The store assigns the version (`max(existing) + 1`). Two writers
    /// racing on the same aggregate produce the same candidate version; the
    /// uniqueness constraint rejects the loser with
    /// [`EventStoreError::VersionConflict`], which is safe to retry.
    ///
    /// Returns the version assigned to the event.
    async fn append(&self, aggregate_id: AggregateId, record: EventRecord) -> Result<Version>;

    /// Returns all events of an aggregate ordered by version (oldest first).
    async fn load(&self, aggregate_id: AggregateId) -> Result<Vec<StoredEvent>>;

    /// Returns the current (highest) version of an aggregate, or `None` if
    /// the aggregate has no events.
    async fn current_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>>;
}

/// Convenience methods shared by every event store.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Appends with a bounded retry on version conflicts.
    async fn append_with_retry(
        &self,
        aggregate_id: AggregateId,
        record: EventRecord,
    ) -> Result<Version> {
        let mut attempt = 0;
        loop {
            match self.append(aggregate_id, record.clone()).await {
                Err(e) if e.is_retryable() && attempt < APPEND_RETRY_ATTEMPTS => {
                    attempt += 1;
                    tracing::debug!(
                        %aggregate_id,
                        attempt,
                        "version conflict on append, retrying"
                    );
                    metrics::counter!("event_store_append_conflicts_total").increment(1);
                }
                other => return other,
            }
        }
    }

    /// Returns true if the aggregate has at least one event.
    async fn aggregate_exists(&self, aggregate_id: AggregateId) -> Result<bool> {
        Ok(self.current_version(aggregate_id).await?.is_some())
    }
}

impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Checks a loaded history for the gapless `1..N` invariant. Used by tests
/// and debug assertions; a violation indicates a corrupted log.
pub fn verify_gapless(events: &[StoredEvent]) -> std::result::Result<(), EventStoreError> {
    for (index, event) in events.iter().enumerate() {
        let expected = Version::new(index as i64 + 1);
        if event.version != expected {
            return Err(EventStoreError::VersionConflict {
                aggregate_id: event.aggregate_id,
                version: event.version,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::Utc;
    use common::EventId;

    use super::*;

    /// Store stub whose first N appends fail with a version conflict.
    struct FlakyStore {
        failures_left: AtomicU32,
    }

    #[async_trait]
    impl EventStore for FlakyStore {
        async fn append(&self, aggregate_id: AggregateId, _record: EventRecord) -> Result<Version> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(EventStoreError::VersionConflict {
                    aggregate_id,
                    version: Version::first(),
                });
            }
            Ok(Version::first())
        }

        async fn load(&self, _aggregate_id: AggregateId) -> Result<Vec<StoredEvent>> {
            Ok(vec![])
        }

        async fn current_version(&self, _aggregate_id: AggregateId) -> Result<Option<Version>> {
            Ok(None)
        }
    }

    fn record() -> EventRecord {
        EventRecord::new(
            EventId::new(),
            "TestEvent",
            serde_json::json!({"test": true}),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn append_with_retry_survives_transient_conflicts() {
        let store = FlakyStore {
            failures_left: AtomicU32::new(2),
        };

        let version = store
            .append_with_retry(AggregateId::new(), record())
            .await
            .unwrap();
        assert_eq!(version, Version::first());
    }

    #[tokio::test]
    async fn append_with_retry_gives_up_eventually() {
        let store = FlakyStore {
            failures_left: AtomicU32::new(100),
        };

        let result = store.append_with_retry(AggregateId::new(), record()).await;
        assert!(matches!(
            result,
            Err(EventStoreError::VersionConflict { .. })
        ));
    }
}
