use common::{OrderId, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use inventory::{InMemoryInventoryStore, InventoryStore, Product, ReservationLine};

fn bench_reserve_release(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let product_id = ProductId::new();
    let store = InMemoryInventoryStore::new();
    runtime.block_on(async {
        store
            .upsert_product(Product::new(product_id, "Widget", "SKU-001", u32::MAX / 2))
            .await
            .unwrap();
    });

    c.bench_function("reserve_release_round_trip", |b| {
        b.to_async(&runtime).iter(|| {
            let store = store.clone();
            async move {
                let order_id = OrderId::new();
                store
                    .reserve(
                        order_id,
                        &[ReservationLine {
                            product_id,
                            quantity: 2,
                        }],
                    )
                    .await
                    .unwrap();
                store.release(order_id).await.unwrap();
            }
        });
    });
}

criterion_group!(benches, bench_reserve_release);
criterion_main!(benches);
