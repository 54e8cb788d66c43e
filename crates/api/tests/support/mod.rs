//! Full in-process wiring of all services over the in-memory bus.
//!
//! Binding order matters for deterministic tests: the read-model feeders
//! (payment amounts, notification customers) bind before the inventory
//! reaction, so by the time the reservation chain fires the projections are
//! populated. On a real broker this ordering is not guaranteed, which is
//! exactly the race the services tolerate.

// Not every test binary touches every helper here.
#![allow(dead_code)]

use std::sync::Arc;

use analytics::{AllEventsConsumer, AnalyticsStore};
use common::ProductId;
use event_bus::InMemoryEventBus;
use event_store::InMemoryEventStore;
use inventory::{InMemoryInventoryStore, InventoryStore, Product};
use notification::{
    InMemoryNotificationRepository, MockNotificationSender, NotificationContext, OrderCustomers,
};
use order::{InMemoryOrderRepository, OrderContext, OrderService};
use payment::{InMemoryPaymentRepository, MockPaymentGateway, OrderAmounts};

pub struct System {
    pub bus: Arc<InMemoryEventBus>,
    pub order_service: OrderService,
    pub inventory_store: Arc<InMemoryInventoryStore>,
    pub payment_repository: Arc<InMemoryPaymentRepository>,
    pub notification_repository: Arc<InMemoryNotificationRepository>,
    pub analytics: AnalyticsStore,
}

pub fn wire(gateway: MockPaymentGateway) -> System {
    let bus = Arc::new(InMemoryEventBus::new());
    let event_store = Arc::new(InMemoryEventStore::new());
    let order_repository = Arc::new(InMemoryOrderRepository::new());
    let inventory_store = Arc::new(InMemoryInventoryStore::new());
    let payment_repository = Arc::new(InMemoryPaymentRepository::new());
    let notification_repository = Arc::new(InMemoryNotificationRepository::new());
    let analytics = AnalyticsStore::new();
    let order_amounts = OrderAmounts::new();
    let order_customers = OrderCustomers::new();

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
    let notification_ctx = NotificationContext::new(
        notification_repository.clone(),
        Arc::new(MockNotificationSender::new()),
        order_customers,
    );

    // Read-model feeders first.
    bus.bind(Arc::new(payment::OrderPlacedConsumer::new(
        order_amounts.clone(),
    )));
    bus.bind(Arc::new(notification::OrderPlacedConsumer::new(
        notification_ctx.clone(),
    )));
    bus.bind(Arc::new(AllEventsConsumer::new(analytics.clone())));

    // Order state machine.
    bus.bind(Arc::new(order::InventoryReservedConsumer::new(
        order_ctx.clone(),
    )));
    bus.bind(Arc::new(order::InventoryReservationFailedConsumer::new(
        order_ctx.clone(),
    )));
    bus.bind(Arc::new(order::PaymentProcessedConsumer::new(
        order_ctx.clone(),
    )));
    bus.bind(Arc::new(order::PaymentFailedConsumer::new(order_ctx)));

    // Payment charge reaction.
    bus.bind(Arc::new(payment::InventoryReservedConsumer::new(
        payment_repository.clone(),
        Arc::new(gateway),
        order_amounts,
        bus.clone(),
    )));

    // Compensation and notifications.
    bus.bind(Arc::new(inventory::InventoryReleasedConsumer::new(
        inventory_store.clone(),
    )));
    bus.bind(Arc::new(notification::OrderConfirmedConsumer::new(
        notification_ctx.clone(),
    )));
    bus.bind(Arc::new(notification::OrderCancelledConsumer::new(
        notification_ctx,
    )));

    // The inventory reaction binds last so every projection above sees
    // OrderPlaced before the reservation chain starts.
    bus.bind(Arc::new(inventory::OrderPlacedConsumer::new(
        inventory_store.clone(),
        bus.clone(),
    )));

    System {
        bus,
        order_service,
        inventory_store,
        payment_repository,
        notification_repository,
        analytics,
    }
}

pub async fn seed_product(system: &System, available: u32) -> ProductId {
    let product_id = ProductId::new();
    system
        .inventory_store
        .upsert_product(Product::new(product_id, "Widget", "SKU-001", available))
        .await
        .unwrap();
    product_id
}
