use common::AggregateId;
use thiserror::Error;

use crate::Version;

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Another writer appended the same version concurrently. The caller
    /// should re-read and retry; [`crate::EventStoreExt::append_with_retry`]
    /// does this with a bounded number of attempts.
    #[error("version conflict for aggregate {aggregate_id}: version {version} already exists")]
    VersionConflict {
        aggregate_id: AggregateId,
        version: Version,
    },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    /// Returns true if the operation may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EventStoreError::VersionConflict { .. })
    }
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
