//! Place-order command and the order query surface.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, ProductId};
use event_store::{EventStore, StoredEvent};
use serde::{Deserialize, Serialize};
use tracing::info;

use event_bus::EventBus;
use events::{DomainEvent, OrderLine};

use crate::{Order, OrderError, OrderEventLog, OrderItem, OrderRepository};

/// One requested line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// Result of a successful placement.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub total_amount: Money,
    pub placed_at: DateTime<Utc>,
}

/// The order service's synchronous surface: one command (place) and the
/// queries. Everything else about an order happens by consuming events.
#[derive(Clone)]
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    event_log: OrderEventLog,
    bus: Arc<dyn EventBus>,
}

impl OrderService {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        store: Arc<dyn EventStore>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            repository,
            event_log: OrderEventLog::new(store),
            bus,
        }
    }

    /// Returns the event log shared with the consumers.
    pub fn event_log(&self) -> OrderEventLog {
        self.event_log.clone()
    }

    /// Places a new order: validates, persists the Pending order, appends
    /// `OrderPlaced` to the event store, then publishes it.
    ///
    /// The append and the publish are not one transaction. A crash between
    /// them loses the publish and strands the order in Pending; this design
    /// has no outbox.
    #[tracing::instrument(skip(self, items), fields(%customer_id))]
    pub async fn place_order(
        &self,
        customer_id: CustomerId,
        items: Vec<PlaceOrderItem>,
    ) -> Result<PlacedOrder, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        for item in &items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product_id,
                    quantity: item.quantity,
                });
            }
            if !item.unit_price.is_positive() {
                return Err(OrderError::InvalidPrice {
                    product_id: item.product_id,
                    price: item.unit_price,
                });
            }
        }

        let order_items: Vec<OrderItem> = items
            .iter()
            .map(|i| OrderItem::new(i.product_id, i.product_name.clone(), i.quantity, i.unit_price))
            .collect();
        let order = Order::place(customer_id, order_items);
        let order_id = order.id;
        let total_amount = order.total_amount;

        self.repository.insert(order).await;

        let lines: Vec<OrderLine> = items
            .into_iter()
            .map(|i| OrderLine::new(i.product_id, i.product_name, i.quantity, i.unit_price))
            .collect();
        let event = DomainEvent::order_placed(order_id, customer_id, lines, total_amount);

        self.event_log.append(&event).await?;
        self.bus.publish(&event).await?;

        metrics::counter!("orders_placed_total").increment(1);
        info!(%order_id, %total_amount, "order placed");

        Ok(PlacedOrder {
            order_id,
            total_amount,
            placed_at: event.occurred_at(),
        })
    }

    /// Loads an order by id.
    pub async fn get_order(&self, order_id: OrderId) -> Option<Order> {
        self.repository.get(order_id).await
    }

    /// Lists a customer's orders, oldest first.
    pub async fn customer_orders(&self, customer_id: CustomerId) -> Vec<Order> {
        self.repository.find_by_customer(customer_id).await
    }

    /// Returns the order's recorded event history for audit.
    pub async fn order_events(&self, order_id: OrderId) -> Result<Vec<StoredEvent>, OrderError> {
        self.event_log.raw_history(order_id).await
    }
}

#[cfg(test)]
mod tests {
    use event_bus::InMemoryEventBus;
    use event_store::InMemoryEventStore;

    use super::*;
    use crate::{InMemoryOrderRepository, OrderStatus};

    struct Setup {
        service: OrderService,
        bus: Arc<InMemoryEventBus>,
    }

    fn setup() -> Setup {
        let bus = Arc::new(InMemoryEventBus::new());
        let service = OrderService::new(
            Arc::new(InMemoryOrderRepository::new()),
            Arc::new(InMemoryEventStore::new()),
            bus.clone(),
        );
        Setup { service, bus }
    }

    fn item(quantity: u32, unit_price_cents: i64) -> PlaceOrderItem {
        PlaceOrderItem {
            product_id: ProductId::new(),
            product_name: "Product".to_string(),
            quantity,
            unit_price: Money::from_cents(unit_price_cents),
        }
    }

    #[tokio::test]
    async fn place_order_computes_total_and_publishes() {
        let Setup { service, bus } = setup();
        let customer_id = CustomerId::new();

        let placed = service
            .place_order(
                customer_id,
                vec![item(2, 99999), item(3, 2999), item(1, 7999)],
            )
            .await
            .unwrap();

        assert_eq!(placed.total_amount, Money::from_cents(216994));

        let order = service.get_order(placed.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 3);

        assert_eq!(bus.published_count("OrderPlaced"), 1);
        match &bus.published()[0] {
            DomainEvent::OrderPlaced(e) => {
                assert_eq!(e.total_amount, Money::from_cents(216994));
                assert_eq!(e.customer_id, customer_id);
                assert_eq!(e.items.len(), 3);
            }
            other => panic!("expected OrderPlaced, got {}", other.event_type()),
        }

        let events = service.order_events(placed.order_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "OrderPlaced");
    }

    #[tokio::test]
    async fn empty_order_is_rejected_synchronously() {
        let Setup { service, bus } = setup();

        let result = service.place_order(CustomerId::new(), vec![]).await;
        assert!(matches!(result, Err(OrderError::EmptyOrder)));
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected_synchronously() {
        let Setup { service, bus } = setup();

        let result = service
            .place_order(CustomerId::new(), vec![item(0, 1000)])
            .await;
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn non_positive_price_is_rejected_synchronously() {
        let Setup { service, bus } = setup();

        let result = service
            .place_order(CustomerId::new(), vec![item(1, 0)])
            .await;
        assert!(matches!(result, Err(OrderError::InvalidPrice { .. })));
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn customer_orders_lists_only_their_orders() {
        let Setup { service, .. } = setup();
        let customer_id = CustomerId::new();

        service
            .place_order(customer_id, vec![item(1, 100)])
            .await
            .unwrap();
        service
            .place_order(customer_id, vec![item(2, 200)])
            .await
            .unwrap();
        service
            .place_order(CustomerId::new(), vec![item(1, 300)])
            .await
            .unwrap();

        assert_eq!(service.customer_orders(customer_id).await.len(), 2);
    }
}
