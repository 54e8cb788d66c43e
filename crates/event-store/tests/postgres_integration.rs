//! PostgreSQL integration tests.
//!
//! These need Docker and are ignored by default. Run with:
//!
//! ```bash
//! cargo test -p event-store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::{AggregateId, EventId};
use event_store::{
    EventRecord, EventStore, EventStoreError, PostgresEventStore, Version, verify_gapless,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests.
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresEventStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_store() -> PostgresEventStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    PostgresEventStore::new(pool)
}

fn record(event_type: &str) -> EventRecord {
    EventRecord::new(
        EventId::new(),
        event_type,
        serde_json::json!({"test": true}),
        Utc::now(),
    )
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn append_and_load_round_trip() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let v1 = store.append(aggregate_id, record("Event1")).await.unwrap();
    let v2 = store.append(aggregate_id, record("Event2")).await.unwrap();
    assert_eq!(v1, Version::new(1));
    assert_eq!(v2, Version::new(2));

    let history = store.load(aggregate_id).await.unwrap();
    assert_eq!(history.len(), 2);
    verify_gapless(&history).unwrap();
    assert_eq!(history[0].event_type, "Event1");
    assert_eq!(history[1].event_type, "Event2");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn unique_constraint_rejects_duplicate_version() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    store.append(aggregate_id, record("Event1")).await.unwrap();

    // Insert a colliding version directly, bypassing append's max+1.
    let result = sqlx::query(
        "INSERT INTO events (id, aggregate_id, event_type, version, occurred_at, payload)
         VALUES ($1, $2, 'Duplicate', 1, now(), '{}')",
    )
    .bind(EventId::new().as_uuid())
    .bind(aggregate_id.as_uuid())
    .execute(store.pool())
    .await;

    assert!(result.is_err());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn concurrent_appends_surface_retryable_conflicts() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.append(aggregate_id, record(&format!("Event{i}"))).await
        }));
    }

    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => {}
            Err(EventStoreError::VersionConflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    // Whatever won, the surviving log must be gapless.
    let history = store.load(aggregate_id).await.unwrap();
    verify_gapless(&history).unwrap();
    assert_eq!(history.len() + conflicts, 8);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn current_version_reflects_appends() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    assert!(store.current_version(aggregate_id).await.unwrap().is_none());

    store.append(aggregate_id, record("Event1")).await.unwrap();
    store.append(aggregate_id, record("Event2")).await.unwrap();

    assert_eq!(
        store.current_version(aggregate_id).await.unwrap(),
        Some(Version::new(2))
    );
}
