use chrono::Utc;
use common::{AggregateId, EventId};
use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{EventRecord, EventStore, InMemoryEventStore};

fn record() -> EventRecord {
    EventRecord::new(
        EventId::new(),
        "BenchEvent",
        serde_json::json!({"value": 42}),
        Utc::now(),
    )
}

fn bench_append(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("append_single_aggregate", |b| {
        b.to_async(&runtime).iter_batched(
            || (InMemoryEventStore::new(), AggregateId::new()),
            |(store, aggregate_id)| async move {
                for _ in 0..100 {
                    store.append(aggregate_id, record()).await.unwrap();
                }
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_load(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let store = InMemoryEventStore::new();
    let aggregate_id = AggregateId::new();
    runtime.block_on(async {
        for _ in 0..1000 {
            store.append(aggregate_id, record()).await.unwrap();
        }
    });

    c.bench_function("load_1000_events", |b| {
        b.to_async(&runtime).iter(|| {
            let store = store.clone();
            async move {
                let history = store.load(aggregate_id).await.unwrap();
                assert_eq!(history.len(), 1000);
            }
        });
    });
}

criterion_group!(benches, bench_append, bench_load);
criterion_main!(benches);
