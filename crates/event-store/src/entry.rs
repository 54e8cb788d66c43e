use chrono::{DateTime, Utc};
use common::{AggregateId, EventId};
use serde::{Deserialize, Serialize};

/// Position of an event within one aggregate's history.
///
/// Versions start at 1 for the first event and increment by 1 for each
/// subsequent event on the aggregate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) of an aggregate with no events.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version (1) of the first event.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// An event to be appended: everything but the aggregate id and the version,
/// which the store assigns.
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// Unique id of the event instance.
    pub event_id: EventId,

    /// The event type tag (e.g. "OrderPlaced").
    pub event_type: String,

    /// The serialized event payload.
    pub payload: serde_json::Value,

    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(
        event_id: EventId,
        event_type: impl Into<String>,
        payload: serde_json::Value,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id,
            event_type: event_type.into(),
            payload,
            occurred_at,
        }
    }
}

/// A persisted event as read back from the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: EventId,
    pub aggregate_id: AggregateId,
    pub event_type: String,
    pub version: Version,
    pub occurred_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}
