//! Notification-side consumers of the choreography.

use std::sync::Arc;

use async_trait::async_trait;
use common::{CustomerId, OrderId};
use tracing::warn;

use event_bus::{EventConsumer, HandlerResult};
use events::DomainEvent;

use crate::{
    Notification, NotificationKind, NotificationRepository, NotificationSender, OrderCustomers,
};

/// Collaborators shared by every notification consumer.
#[derive(Clone)]
pub struct NotificationContext {
    pub repository: Arc<dyn NotificationRepository>,
    pub sender: Arc<dyn NotificationSender>,
    pub customers: OrderCustomers,
}

impl NotificationContext {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        sender: Arc<dyn NotificationSender>,
        customers: OrderCustomers,
    ) -> Self {
        Self {
            repository,
            sender,
            customers,
        }
    }

    /// Persists the notification, attempts delivery, and records the result.
    async fn dispatch(&self, mut notification: Notification) -> HandlerResult {
        self.repository.insert(notification.clone()).await;

        match self.sender.send(&notification).await {
            Ok(()) => notification.mark_sent(),
            Err(e) => {
                warn!(order_id = %notification.order_id, error = %e, "notification delivery failed");
                notification.mark_failed();
            }
        }
        self.repository.update(notification).await;
        Ok(())
    }
}

/// Notifies the customer that their order was received.
pub struct OrderPlacedConsumer {
    ctx: NotificationContext,
}

impl OrderPlacedConsumer {
    pub fn new(ctx: NotificationContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl EventConsumer for OrderPlacedConsumer {
    fn queue_name(&self) -> &str {
        "notification-service-orderplaced"
    }

    fn routing_keys(&self) -> &[&str] {
        &["event.orderplaced"]
    }

    async fn handle(&self, event: DomainEvent) -> HandlerResult {
        let DomainEvent::OrderPlaced(placed) = event else {
            warn!("unexpected event on notification queue, ignoring");
            return Ok(());
        };

        self.ctx.customers.record(placed.order_id, placed.customer_id);

        let notification = Notification::email(
            placed.order_id,
            placed.customer_id,
            NotificationKind::OrderPlaced,
            "Order Placed Successfully",
            format!(
                "Your order #{} has been placed successfully. Total amount: {}",
                placed.order_id, placed.total_amount
            ),
        );
        self.ctx.dispatch(notification).await
    }
}

/// Notifies the customer that their order was confirmed.
pub struct OrderConfirmedConsumer {
    ctx: NotificationContext,
}

impl OrderConfirmedConsumer {
    pub fn new(ctx: NotificationContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl EventConsumer for OrderConfirmedConsumer {
    fn queue_name(&self) -> &str {
        "notification-service-orderconfirmed"
    }

    fn routing_keys(&self) -> &[&str] {
        &["event.orderconfirmed"]
    }

    async fn handle(&self, event: DomainEvent) -> HandlerResult {
        let DomainEvent::OrderConfirmed(confirmed) = event else {
            warn!("unexpected event on notification queue, ignoring");
            return Ok(());
        };

        let Some(customer_id) = self.lookup_customer(confirmed.order_id) else {
            return Ok(());
        };

        let notification = Notification::email(
            confirmed.order_id,
            customer_id,
            NotificationKind::OrderConfirmed,
            "Order Confirmed",
            format!(
                "Your order #{} has been confirmed and is being prepared.",
                confirmed.order_id
            ),
        );
        self.ctx.dispatch(notification).await
    }
}

impl OrderConfirmedConsumer {
    fn lookup_customer(&self, order_id: OrderId) -> Option<CustomerId> {
        let customer = self.ctx.customers.get(order_id);
        if customer.is_none() {
            // Best-effort: without the OrderPlaced projection there is no
            // one to address; skip rather than drop the message as an error.
            warn!(%order_id, "no customer known for order, skipping notification");
        }
        customer
    }
}

/// Notifies the customer that their order was cancelled.
pub struct OrderCancelledConsumer {
    ctx: NotificationContext,
}

impl OrderCancelledConsumer {
    pub fn new(ctx: NotificationContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl EventConsumer for OrderCancelledConsumer {
    fn queue_name(&self) -> &str {
        "notification-service-ordercancelled"
    }

    fn routing_keys(&self) -> &[&str] {
        &["event.ordercancelled"]
    }

    async fn handle(&self, event: DomainEvent) -> HandlerResult {
        let DomainEvent::OrderCancelled(cancelled) = event else {
            warn!("unexpected event on notification queue, ignoring");
            return Ok(());
        };

        let Some(customer_id) = self.ctx.customers.get(cancelled.order_id) else {
            warn!(order_id = %cancelled.order_id, "no customer known for order, skipping notification");
            return Ok(());
        };

        let notification = Notification::email(
            cancelled.order_id,
            customer_id,
            NotificationKind::OrderCancelled,
            "Order Cancelled",
            format!(
                "Your order #{} has been cancelled. Reason: {}",
                cancelled.order_id, cancelled.reason
            ),
        );
        self.ctx.dispatch(notification).await
    }
}
