//! Order-side consumers: the state machine transitions of the saga.
//!
//! Each consumer advances the order's status in reaction to one event type
//! and publishes the next event in the chain. A missing order is logged and
//! the event acknowledged; a terminal order ignores further transitions
//! (late deliveries race across queues and must not resurrect a settled
//! order).

use std::sync::Arc;

use async_trait::async_trait;
use common::ReservationId;
use tracing::{info, warn};
use uuid::Uuid;

use event_bus::{EventBus, EventConsumer, HandlerResult};
use events::DomainEvent;

use crate::{Order, OrderEventLog, OrderRepository, OrderStatus};

/// The explicit bundle of collaborators every order consumer needs.
#[derive(Clone)]
pub struct OrderContext {
    pub repository: Arc<dyn OrderRepository>,
    pub event_log: OrderEventLog,
    pub bus: Arc<dyn EventBus>,
}

impl OrderContext {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        event_log: OrderEventLog,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            repository,
            event_log,
            bus,
        }
    }

    /// Loads the order for a trigger event, or logs why not.
    ///
    /// Both outcomes acknowledge the message: a missing order is a warning
    /// (the event may belong to another deployment's data), and a terminal
    /// order means a late or racing delivery that must not be re-applied.
    async fn order_for(&self, event: &DomainEvent) -> Option<Order> {
        let order_id = event.order_id();
        let Some(order) = self.repository.get(order_id).await else {
            warn!(%order_id, event_type = event.event_type(), "order not found, dropping event");
            return None;
        };
        if order.status.is_terminal() {
            warn!(
                %order_id,
                status = %order.status,
                event_type = event.event_type(),
                "order already settled, ignoring event"
            );
            return None;
        }
        Some(order)
    }

    /// Records an event in the order's log and publishes it.
    async fn record_and_publish(&self, event: &DomainEvent) -> HandlerResult {
        self.event_log.append(event).await?;
        self.bus.publish(event).await?;
        Ok(())
    }
}

/// `InventoryReserved` → status `InventoryReserved`, reservation id noted.
pub struct InventoryReservedConsumer {
    ctx: OrderContext,
}

impl InventoryReservedConsumer {
    pub fn new(ctx: OrderContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl EventConsumer for InventoryReservedConsumer {
    fn queue_name(&self) -> &str {
        "order-service-inventoryreserved"
    }

    fn routing_keys(&self) -> &[&str] {
        &["event.inventoryreserved"]
    }

    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type()))]
    async fn handle(&self, event: DomainEvent) -> HandlerResult {
        let DomainEvent::InventoryReserved(ref reserved) = event else {
            warn!("unexpected event on order queue, ignoring");
            return Ok(());
        };
        let Some(mut order) = self.ctx.order_for(&event).await else {
            return Ok(());
        };

        order.transition(OrderStatus::InventoryReserved);
        order.reservation_id = Some(reserved.reservation_id);
        self.ctx.repository.update(order).await;
        self.ctx.event_log.append(&event).await?;

        info!(order_id = %reserved.order_id, "order inventory reserved");
        Ok(())
    }
}

/// `InventoryReservationFailed` → status `Cancelled`, `OrderCancelled` out.
pub struct InventoryReservationFailedConsumer {
    ctx: OrderContext,
}

impl InventoryReservationFailedConsumer {
    pub fn new(ctx: OrderContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl EventConsumer for InventoryReservationFailedConsumer {
    fn queue_name(&self) -> &str {
        "order-service-inventoryreservationfailed"
    }

    fn routing_keys(&self) -> &[&str] {
        &["event.inventoryreservationfailed"]
    }

    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type()))]
    async fn handle(&self, event: DomainEvent) -> HandlerResult {
        let DomainEvent::InventoryReservationFailed(ref failed) = event else {
            warn!("unexpected event on order queue, ignoring");
            return Ok(());
        };
        let Some(mut order) = self.ctx.order_for(&event).await else {
            return Ok(());
        };

        order.transition(OrderStatus::Cancelled);
        self.ctx.repository.update(order).await;
        self.ctx.event_log.append(&event).await?;

        let cancelled = DomainEvent::order_cancelled(failed.order_id, failed.reason.clone());
        self.ctx.record_and_publish(&cancelled).await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        info!(order_id = %failed.order_id, reason = %failed.reason, "order cancelled");
        Ok(())
    }
}

/// `PaymentProcessed` → status `Confirmed`, `OrderConfirmed` out.
pub struct PaymentProcessedConsumer {
    ctx: OrderContext,
}

impl PaymentProcessedConsumer {
    pub fn new(ctx: OrderContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl EventConsumer for PaymentProcessedConsumer {
    fn queue_name(&self) -> &str {
        "order-service-paymentprocessed"
    }

    fn routing_keys(&self) -> &[&str] {
        &["event.paymentprocessed"]
    }

    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type()))]
    async fn handle(&self, event: DomainEvent) -> HandlerResult {
        let DomainEvent::PaymentProcessed(ref processed) = event else {
            warn!("unexpected event on order queue, ignoring");
            return Ok(());
        };
        let Some(mut order) = self.ctx.order_for(&event).await else {
            return Ok(());
        };

        order.transition(OrderStatus::Confirmed);
        self.ctx.repository.update(order).await;
        self.ctx.event_log.append(&event).await?;

        let confirmed = DomainEvent::order_confirmed(processed.order_id);
        self.ctx.record_and_publish(&confirmed).await?;

        metrics::counter!("orders_confirmed_total").increment(1);
        info!(order_id = %processed.order_id, "order confirmed");
        Ok(())
    }
}

/// `PaymentFailed` → status `Failed`, then `InventoryReleased` and
/// `OrderCancelled` out: the compensating pair of the saga.
pub struct PaymentFailedConsumer {
    ctx: OrderContext,
}

impl PaymentFailedConsumer {
    pub fn new(ctx: OrderContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl EventConsumer for PaymentFailedConsumer {
    fn queue_name(&self) -> &str {
        "order-service-paymentfailed"
    }

    fn routing_keys(&self) -> &[&str] {
        &["event.paymentfailed"]
    }

    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type()))]
    async fn handle(&self, event: DomainEvent) -> HandlerResult {
        let DomainEvent::PaymentFailed(ref failed) = event else {
            warn!("unexpected event on order queue, ignoring");
            return Ok(());
        };
        let Some(mut order) = self.ctx.order_for(&event).await else {
            return Ok(());
        };

        order.transition(OrderStatus::Failed);
        let reservation_id = order.reservation_id;
        self.ctx.repository.update(order).await;
        self.ctx.event_log.append(&event).await?;

        // The reservation id was recorded when InventoryReserved arrived.
        // If PaymentFailed won the cross-queue race against it, the field is
        // still empty; the release consumer keys on the order id, so a nil
        // id only degrades the audit trail.
        let reservation_id = reservation_id.unwrap_or_else(|| {
            warn!(order_id = %failed.order_id, "no reservation id recorded for order");
            ReservationId::from_uuid(Uuid::nil())
        });

        let released = DomainEvent::inventory_released(failed.order_id, reservation_id);
        self.ctx.record_and_publish(&released).await?;

        let cancelled = DomainEvent::order_cancelled(
            failed.order_id,
            format!("Payment failed: {}", failed.reason),
        );
        self.ctx.record_and_publish(&cancelled).await?;

        metrics::counter!("orders_failed_total").increment(1);
        info!(order_id = %failed.order_id, reason = %failed.reason, "order failed");
        Ok(())
    }
}
