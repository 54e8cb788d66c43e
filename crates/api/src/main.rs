//! Process bootstrap: wires all four services plus analytics onto one bus
//! and serves the HTTP boundary.
//!
//! Each service could be hosted in its own process with the same wiring;
//! the reference deployment runs them together over in-memory stores and a
//! real broker.

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

use analytics::{AllEventsConsumer, AnalyticsStore};
use api::config::HttpConfig;
use common::ProductId;
use event_bus::{
    BusConfig, ConsumerRuntime, EventConsumer, InMemoryEventDeduplicator, RabbitMqEventBus,
    ShutdownSignal,
};
use event_store::InMemoryEventStore;
use inventory::{InMemoryInventoryStore, InventoryStore, Product};
use notification::{
    InMemoryNotificationRepository, MockNotificationSender, NotificationContext, OrderCustomers,
};
use order::{InMemoryOrderRepository, OrderContext, OrderService};
use payment::{InMemoryPaymentRepository, MockPaymentGateway, OrderAmounts};

/// Demo catalog seeded at startup so orders can be placed immediately.
const SEED_PRODUCTS: &[(&str, &str, &str, u32)] = &[
    (
        "7b1e3f86-9c2a-4d7e-b1a4-0f6f8a1c2d31",
        "Laptop Pro 15",
        "SKU-LAPTOP-15",
        25,
    ),
    (
        "5c8d2a1f-3e6b-4c9d-8f2e-7a4b9c0d1e52",
        "Wireless Mouse",
        "SKU-MOUSE-W1",
        200,
    ),
    (
        "9f4a6b2c-1d8e-4f3a-9c5b-2e7d0a8b3c73",
        "USB-C Dock",
        "SKU-DOCK-C1",
        60,
    ),
];

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn seed_inventory(store: &InMemoryInventoryStore) {
    for (id, name, sku, quantity) in SEED_PRODUCTS {
        let product_id = match Uuid::parse_str(id) {
            Ok(uuid) => ProductId::from_uuid(uuid),
            Err(e) => {
                tracing::error!(id, error = %e, "bad seed product id");
                continue;
            }
        };
        if let Err(e) = store
            .upsert_product(Product::new(product_id, *name, *sku, *quantity))
            .await
        {
            tracing::error!(sku, error = %e, "failed to seed product");
        } else {
            tracing::info!(%product_id, sku, quantity, "seeded product");
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Broker configuration is strict: refuse to start without it
    let bus_config = match BusConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid broker configuration");
            std::process::exit(1);
        }
    };

    // 4. Stores and read models (in-memory reference backends)
    let event_store = Arc::new(InMemoryEventStore::new());
    let order_repository = Arc::new(InMemoryOrderRepository::new());
    let inventory_store = Arc::new(InMemoryInventoryStore::new());
    let payment_repository = Arc::new(InMemoryPaymentRepository::new());
    let notification_repository = Arc::new(InMemoryNotificationRepository::new());
    let analytics_store = AnalyticsStore::new();
    let order_amounts = OrderAmounts::new();
    let order_customers = OrderCustomers::new();

    seed_inventory(&inventory_store).await;

    // 5. Bus and services
    let bus = Arc::new(RabbitMqEventBus::new(bus_config.clone()));
    let order_service = OrderService::new(
        order_repository.clone(),
        event_store.clone(),
        bus.clone(),
    );
    let order_ctx = OrderContext::new(
        order_repository.clone(),
        order_service.event_log(),
        bus.clone(),
    );
    let payment_gateway = Arc::new(
        MockPaymentGateway::new().with_latency(std::time::Duration::from_secs(1)),
    );
    let notification_ctx = NotificationContext::new(
        notification_repository.clone(),
        Arc::new(MockNotificationSender::new()),
        order_customers.clone(),
    );

    // 6. One consumer runtime task per (service, event type)
    let consumers: Vec<Arc<dyn EventConsumer>> = vec![
        // order service
        Arc::new(order::InventoryReservedConsumer::new(order_ctx.clone())),
        Arc::new(order::InventoryReservationFailedConsumer::new(order_ctx.clone())),
        Arc::new(order::PaymentProcessedConsumer::new(order_ctx.clone())),
        Arc::new(order::PaymentFailedConsumer::new(order_ctx.clone())),
        // inventory service
        Arc::new(inventory::OrderPlacedConsumer::new(
            inventory_store.clone(),
            bus.clone(),
        )),
        Arc::new(inventory::InventoryReleasedConsumer::new(
            inventory_store.clone(),
        )),
        // payment service
        Arc::new(payment::OrderPlacedConsumer::new(order_amounts.clone())),
        Arc::new(payment::InventoryReservedConsumer::new(
            payment_repository.clone(),
            payment_gateway,
            order_amounts,
            bus.clone(),
        )),
        // notification service
        Arc::new(notification::OrderPlacedConsumer::new(notification_ctx.clone())),
        Arc::new(notification::OrderConfirmedConsumer::new(notification_ctx.clone())),
        Arc::new(notification::OrderCancelledConsumer::new(notification_ctx)),
        // analytics service
        Arc::new(AllEventsConsumer::new(analytics_store.clone())),
    ];

    let runtime = ConsumerRuntime::new(bus_config, Arc::new(InMemoryEventDeduplicator::new()));
    let shutdown = ShutdownSignal::new();
    let mut consumer_tasks = Vec::new();
    for consumer in consumers {
        consumer_tasks.push(runtime.spawn(consumer, &shutdown));
    }

    // 7. HTTP boundary
    let state = Arc::new(api::AppState {
        order_service,
        analytics: analytics_store,
    });
    let app = api::create_app(state, metrics_handle);

    let http_config = HttpConfig::from_env();
    let addr = http_config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 8. Stop consumers and close the bus
    shutdown.shutdown();
    for task in consumer_tasks {
        let _ = task.await;
    }
    if let Err(e) = bus.close().await {
        tracing::warn!(error = %e, "error closing event bus");
    }

    tracing::info!("server shut down gracefully");
}
