//! Payment-side consumers of the choreography.

use std::sync::Arc;

use async_trait::async_trait;
use common::Money;
use tracing::{debug, warn};

use event_bus::{EventBus, EventConsumer, HandlerResult};
use events::DomainEvent;

use crate::{
    GatewayOutcome, OrderAmounts, Payment, PaymentGateway, PaymentRepository,
};

const PAYMENT_METHOD: &str = "CreditCard";

/// Feeds the order-amount read model from `OrderPlaced`.
pub struct OrderPlacedConsumer {
    amounts: OrderAmounts,
}

impl OrderPlacedConsumer {
    pub fn new(amounts: OrderAmounts) -> Self {
        Self { amounts }
    }
}

#[async_trait]
impl EventConsumer for OrderPlacedConsumer {
    fn queue_name(&self) -> &str {
        "payment-service-orderplaced"
    }

    fn routing_keys(&self) -> &[&str] {
        &["event.orderplaced"]
    }

    async fn handle(&self, event: DomainEvent) -> HandlerResult {
        let DomainEvent::OrderPlaced(placed) = event else {
            warn!("unexpected event on payment queue, ignoring");
            return Ok(());
        };

        self.amounts.record(placed.order_id, placed.total_amount);
        debug!(order_id = %placed.order_id, amount = %placed.total_amount, "order amount recorded");
        Ok(())
    }
}

/// Reacts to `InventoryReserved`: charges the order through the gateway and
/// answers with `PaymentProcessed` or `PaymentFailed`.
pub struct InventoryReservedConsumer {
    repository: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    amounts: OrderAmounts,
    bus: Arc<dyn EventBus>,
}

impl InventoryReservedConsumer {
    pub fn new(
        repository: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        amounts: OrderAmounts,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            repository,
            gateway,
            amounts,
            bus,
        }
    }
}

#[async_trait]
impl EventConsumer for InventoryReservedConsumer {
    fn queue_name(&self) -> &str {
        "payment-service-inventoryreserved"
    }

    fn routing_keys(&self) -> &[&str] {
        &["event.inventoryreserved"]
    }

    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type()))]
    async fn handle(&self, event: DomainEvent) -> HandlerResult {
        let DomainEvent::InventoryReserved(reserved) = event else {
            warn!("unexpected event on payment queue, ignoring");
            return Ok(());
        };
        let order_id = reserved.order_id;

        // The amount comes from this service's own OrderPlaced projection.
        // An unknown order is a domain failure, not an infrastructure one:
        // publishing PaymentFailed keeps the choreography moving toward
        // cancellation instead of silently dropping the order.
        let Some(amount) = self.amounts.get(order_id) else {
            warn!(%order_id, "no recorded amount for order, failing payment");
            let mut payment = Payment::processing(order_id, Money::zero(), PAYMENT_METHOD);
            payment.fail("ORDER_UNKNOWN", "Order amount unknown to payment service");
            self.repository.insert(payment).await;

            self.bus
                .publish(&DomainEvent::payment_failed(
                    order_id,
                    Money::zero(),
                    "Order amount unknown to payment service",
                    "ORDER_UNKNOWN",
                ))
                .await?;
            return Ok(());
        };

        let mut payment = Payment::processing(order_id, amount, PAYMENT_METHOD);
        self.repository.insert(payment.clone()).await;

        match self.gateway.process(amount, PAYMENT_METHOD).await {
            GatewayOutcome::Approved { transaction_id } => {
                payment.complete(transaction_id.clone());
                self.repository.update(payment.clone()).await;

                self.bus
                    .publish(&DomainEvent::payment_processed(
                        order_id,
                        payment.id,
                        amount,
                        PAYMENT_METHOD,
                        transaction_id,
                    ))
                    .await?;
            }
            GatewayOutcome::Declined {
                error_code,
                message,
            } => {
                payment.fail(error_code.clone(), message.clone());
                self.repository.update(payment).await;

                self.bus
                    .publish(&DomainEvent::payment_failed(
                        order_id, amount, message, error_code,
                    ))
                    .await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use common::{CustomerId, Money, OrderId, ReservationId};
    use event_bus::InMemoryEventBus;

    use super::*;
    use crate::{InMemoryPaymentRepository, MockPaymentGateway, PaymentStatus};

    struct Setup {
        repository: Arc<InMemoryPaymentRepository>,
        amounts: OrderAmounts,
        bus: Arc<InMemoryEventBus>,
    }

    fn setup() -> Setup {
        Setup {
            repository: Arc::new(InMemoryPaymentRepository::new()),
            amounts: OrderAmounts::new(),
            bus: Arc::new(InMemoryEventBus::new()),
        }
    }

    fn consumer(setup: &Setup, gateway: MockPaymentGateway) -> InventoryReservedConsumer {
        InventoryReservedConsumer::new(
            setup.repository.clone(),
            Arc::new(gateway),
            setup.amounts.clone(),
            setup.bus.clone(),
        )
    }

    fn reserved_event(order_id: OrderId) -> DomainEvent {
        DomainEvent::inventory_reserved(order_id, ReservationId::new(), vec![])
    }

    #[tokio::test]
    async fn order_placed_records_the_amount() {
        let setup = setup();
        let consumer = OrderPlacedConsumer::new(setup.amounts.clone());
        let order_id = OrderId::new();

        consumer
            .handle(DomainEvent::order_placed(
                order_id,
                CustomerId::new(),
                vec![],
                Money::from_cents(7500),
            ))
            .await
            .unwrap();

        assert_eq!(setup.amounts.get(order_id), Some(Money::from_cents(7500)));
    }

    #[tokio::test]
    async fn approved_charge_publishes_payment_processed() {
        let setup = setup();
        let order_id = OrderId::new();
        setup.amounts.record(order_id, Money::from_cents(5000));

        consumer(&setup, MockPaymentGateway::always_approve())
            .handle(reserved_event(order_id))
            .await
            .unwrap();

        assert_eq!(setup.bus.published_count("PaymentProcessed"), 1);
        match &setup.bus.published()[0] {
            DomainEvent::PaymentProcessed(e) => {
                assert_eq!(e.order_id, order_id);
                assert_eq!(e.amount, Money::from_cents(5000));
                assert!(e.transaction_id.starts_with("TXN-"));
            }
            other => panic!("expected PaymentProcessed, got {}", other.event_type()),
        }

        let payments = setup.repository.find_by_order(order_id).await;
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn declined_charge_publishes_payment_failed() {
        let setup = setup();
        let order_id = OrderId::new();
        setup.amounts.record(order_id, Money::from_cents(5000));

        consumer(&setup, MockPaymentGateway::always_decline())
            .handle(reserved_event(order_id))
            .await
            .unwrap();

        assert_eq!(setup.bus.published_count("PaymentFailed"), 1);
        match &setup.bus.published()[0] {
            DomainEvent::PaymentFailed(e) => {
                assert_eq!(e.error_code, "INSUFFICIENT_FUNDS");
                assert_eq!(e.amount, Money::from_cents(5000));
            }
            other => panic!("expected PaymentFailed, got {}", other.event_type()),
        }

        let payments = setup.repository.find_by_order(order_id).await;
        assert_eq!(payments[0].status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn unknown_order_fails_the_payment_instead_of_dropping() {
        let setup = setup();
        let order_id = OrderId::new();

        consumer(&setup, MockPaymentGateway::always_approve())
            .handle(reserved_event(order_id))
            .await
            .unwrap();

        assert_eq!(setup.bus.published_count("PaymentFailed"), 1);
        match &setup.bus.published()[0] {
            DomainEvent::PaymentFailed(e) => {
                assert_eq!(e.error_code, "ORDER_UNKNOWN");
            }
            other => panic!("expected PaymentFailed, got {}", other.event_type()),
        }
    }
}
