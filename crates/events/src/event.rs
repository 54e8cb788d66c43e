//! Event types and their wire representation.

use chrono::{DateTime, Utc};
use common::{CustomerId, EventId, Money, OrderId, PaymentId, ProductId, ReservationId};
use serde::{Deserialize, Serialize};

/// An item of an order as carried by [`OrderPlaced`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderLine {
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns `quantity × unit_price`.
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A reserved line as carried by [`InventoryReserved`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A new order entered the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub items: Vec<OrderLine>,
    pub total_amount: Money,
    pub placed_at: DateTime<Utc>,
}

/// The order reached its successful terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfirmed {
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
    pub order_id: OrderId,
    pub confirmed_at: DateTime<Utc>,
}

/// The order was cancelled somewhere along the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
    pub order_id: OrderId,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

/// Stock was set aside for every item of the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryReserved {
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
    pub order_id: OrderId,
    pub reservation_id: ReservationId,
    pub reserved_items: Vec<ReservedItem>,
    pub reserved_at: DateTime<Utc>,
}

/// The reservation was rejected; no counters moved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryReservationFailed {
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
    pub order_id: OrderId,
    pub reason: String,
    pub unavailable_product_ids: Vec<ProductId>,
    pub failed_at: DateTime<Utc>,
}

/// A previously made reservation was compensated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryReleased {
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
    pub order_id: OrderId,
    pub reservation_id: ReservationId,
    pub released_at: DateTime<Utc>,
}

/// The payment gateway accepted the charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentProcessed {
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
    pub order_id: OrderId,
    pub payment_id: PaymentId,
    pub amount: Money,
    pub payment_method: String,
    pub transaction_id: String,
    pub processed_at: DateTime<Utc>,
}

/// The payment gateway declined the charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentFailed {
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
    pub order_id: OrderId,
    pub amount: Money,
    pub reason: String,
    pub error_code: String,
    pub failed_at: DateTime<Utc>,
}

/// Every integration event of the order-processing saga.
///
/// The internally tagged representation makes the serialized form a flat
/// object carrying an `event_type` discriminator next to the payload fields,
/// which is exactly what goes over the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum DomainEvent {
    OrderPlaced(OrderPlaced),
    OrderConfirmed(OrderConfirmed),
    OrderCancelled(OrderCancelled),
    InventoryReserved(InventoryReserved),
    InventoryReservationFailed(InventoryReservationFailed),
    InventoryReleased(InventoryReleased),
    PaymentProcessed(PaymentProcessed),
    PaymentFailed(PaymentFailed),
}

impl DomainEvent {
    /// Returns the event type tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::OrderPlaced(_) => "OrderPlaced",
            DomainEvent::OrderConfirmed(_) => "OrderConfirmed",
            DomainEvent::OrderCancelled(_) => "OrderCancelled",
            DomainEvent::InventoryReserved(_) => "InventoryReserved",
            DomainEvent::InventoryReservationFailed(_) => "InventoryReservationFailed",
            DomainEvent::InventoryReleased(_) => "InventoryReleased",
            DomainEvent::PaymentProcessed(_) => "PaymentProcessed",
            DomainEvent::PaymentFailed(_) => "PaymentFailed",
        }
    }

    /// Returns the unique id of this event instance.
    pub fn event_id(&self) -> EventId {
        match self {
            DomainEvent::OrderPlaced(e) => e.event_id,
            DomainEvent::OrderConfirmed(e) => e.event_id,
            DomainEvent::OrderCancelled(e) => e.event_id,
            DomainEvent::InventoryReserved(e) => e.event_id,
            DomainEvent::InventoryReservationFailed(e) => e.event_id,
            DomainEvent::InventoryReleased(e) => e.event_id,
            DomainEvent::PaymentProcessed(e) => e.event_id,
            DomainEvent::PaymentFailed(e) => e.event_id,
        }
    }

    /// Returns the order this event belongs to.
    pub fn order_id(&self) -> OrderId {
        match self {
            DomainEvent::OrderPlaced(e) => e.order_id,
            DomainEvent::OrderConfirmed(e) => e.order_id,
            DomainEvent::OrderCancelled(e) => e.order_id,
            DomainEvent::InventoryReserved(e) => e.order_id,
            DomainEvent::InventoryReservationFailed(e) => e.order_id,
            DomainEvent::InventoryReleased(e) => e.order_id,
            DomainEvent::PaymentProcessed(e) => e.order_id,
            DomainEvent::PaymentFailed(e) => e.order_id,
        }
    }

    /// Returns when this event occurred.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DomainEvent::OrderPlaced(e) => e.occurred_at,
            DomainEvent::OrderConfirmed(e) => e.occurred_at,
            DomainEvent::OrderCancelled(e) => e.occurred_at,
            DomainEvent::InventoryReserved(e) => e.occurred_at,
            DomainEvent::InventoryReservationFailed(e) => e.occurred_at,
            DomainEvent::InventoryReleased(e) => e.occurred_at,
            DomainEvent::PaymentProcessed(e) => e.occurred_at,
            DomainEvent::PaymentFailed(e) => e.occurred_at,
        }
    }

    /// Returns the topic routing key: `event.<lowercase event type>`.
    pub fn routing_key(&self) -> String {
        format!("event.{}", self.event_type().to_ascii_lowercase())
    }
}

// Convenience constructors. Each stamps a fresh event id and the current
// time so callers only provide the payload.
impl DomainEvent {
    pub fn order_placed(
        order_id: OrderId,
        customer_id: CustomerId,
        items: Vec<OrderLine>,
        total_amount: Money,
    ) -> Self {
        let now = Utc::now();
        DomainEvent::OrderPlaced(OrderPlaced {
            event_id: EventId::new(),
            occurred_at: now,
            order_id,
            customer_id,
            items,
            total_amount,
            placed_at: now,
        })
    }

    pub fn order_confirmed(order_id: OrderId) -> Self {
        let now = Utc::now();
        DomainEvent::OrderConfirmed(OrderConfirmed {
            event_id: EventId::new(),
            occurred_at: now,
            order_id,
            confirmed_at: now,
        })
    }

    pub fn order_cancelled(order_id: OrderId, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        DomainEvent::OrderCancelled(OrderCancelled {
            event_id: EventId::new(),
            occurred_at: now,
            order_id,
            reason: reason.into(),
            cancelled_at: now,
        })
    }

    pub fn inventory_reserved(
        order_id: OrderId,
        reservation_id: ReservationId,
        reserved_items: Vec<ReservedItem>,
    ) -> Self {
        let now = Utc::now();
        DomainEvent::InventoryReserved(InventoryReserved {
            event_id: EventId::new(),
            occurred_at: now,
            order_id,
            reservation_id,
            reserved_items,
            reserved_at: now,
        })
    }

    pub fn inventory_reservation_failed(
        order_id: OrderId,
        reason: impl Into<String>,
        unavailable_product_ids: Vec<ProductId>,
    ) -> Self {
        let now = Utc::now();
        DomainEvent::InventoryReservationFailed(InventoryReservationFailed {
            event_id: EventId::new(),
            occurred_at: now,
            order_id,
            reason: reason.into(),
            unavailable_product_ids,
            failed_at: now,
        })
    }

    pub fn inventory_released(order_id: OrderId, reservation_id: ReservationId) -> Self {
        let now = Utc::now();
        DomainEvent::InventoryReleased(InventoryReleased {
            event_id: EventId::new(),
            occurred_at: now,
            order_id,
            reservation_id,
            released_at: now,
        })
    }

    pub fn payment_processed(
        order_id: OrderId,
        payment_id: PaymentId,
        amount: Money,
        payment_method: impl Into<String>,
        transaction_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        DomainEvent::PaymentProcessed(PaymentProcessed {
            event_id: EventId::new(),
            occurred_at: now,
            order_id,
            payment_id,
            amount,
            payment_method: payment_method.into(),
            transaction_id: transaction_id.into(),
            processed_at: now,
        })
    }

    pub fn payment_failed(
        order_id: OrderId,
        amount: Money,
        reason: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        DomainEvent::PaymentFailed(PaymentFailed {
            event_id: EventId::new(),
            occurred_at: now,
            order_id,
            amount,
            reason: reason.into(),
            error_code: error_code.into(),
            failed_at: now,
        })
    }
}
