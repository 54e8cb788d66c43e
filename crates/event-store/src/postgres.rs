use async_trait::async_trait;
use common::{AggregateId, EventId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{EventRecord, EventStoreError, Result, StoredEvent, Version, store::EventStore};

/// PostgreSQL-backed event store.
///
/// The `unique_aggregate_version` constraint on `(aggregate_id, version)` is
/// what makes the read-then-write append safe under concurrent writers: the
/// second writer's insert is rejected and mapped to a retryable
/// [`EventStoreError::VersionConflict`].
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a new PostgreSQL event store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_event(row: PgRow) -> Result<StoredEvent> {
        Ok(StoredEvent {
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            aggregate_id: AggregateId::from_uuid(row.try_get::<Uuid, _>("aggregate_id")?),
            event_type: row.try_get("event_type")?,
            version: Version::new(row.try_get("version")?),
            occurred_at: row.try_get("occurred_at")?,
            payload: row.try_get("payload")?,
        })
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append(&self, aggregate_id: AggregateId, record: EventRecord) -> Result<Version> {
        let current: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM events WHERE aggregate_id = $1")
                .bind(aggregate_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        let version = Version::new(current.unwrap_or(0) + 1);

        sqlx::query(
            r#"
            INSERT INTO events (id, aggregate_id, event_type, version, occurred_at, payload)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.event_id.as_uuid())
        .bind(aggregate_id.as_uuid())
        .bind(&record.event_type)
        .bind(version.as_i64())
        .bind(record.occurred_at)
        .bind(&record.payload)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_aggregate_version")
            {
                return EventStoreError::VersionConflict {
                    aggregate_id,
                    version,
                };
            }
            EventStoreError::Database(e)
        })?;

        metrics::counter!("event_store_appends_total").increment(1);
        Ok(version)
    }

    async fn load(&self, aggregate_id: AggregateId) -> Result<Vec<StoredEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT id, aggregate_id, event_type, version, occurred_at, payload
            FROM events
            WHERE aggregate_id = $1
            ORDER BY version ASC
            "#,
        )
        .bind(aggregate_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn current_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM events WHERE aggregate_id = $1")
                .bind(aggregate_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(version.map(Version::new))
    }
}
