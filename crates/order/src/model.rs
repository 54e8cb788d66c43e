use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, ProductId, ReservationId};
use serde::{Deserialize, Serialize};

/// Status of an order along the saga.
///
/// ```text
/// Pending ──► InventoryReserved ──► Confirmed
///    │               │
///    │               └──► Failed (payment declined)
///    └──► Cancelled (reservation rejected)
/// ```
///
/// `Confirmed`, `Cancelled` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Placed, waiting for the inventory reaction.
    #[default]
    Pending,

    /// Stock is held; waiting for the payment reaction.
    InventoryReserved,

    /// Payment captured; kept distinct from `Confirmed` for orders observed
    /// between the payment event and the confirmation.
    PaymentProcessed,

    /// Successful terminal state.
    Confirmed,

    /// Cancelled before payment (terminal).
    Cancelled,

    /// Payment failed (terminal); inventory compensation was requested.
    Failed,
}

impl OrderStatus {
    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Confirmed | OrderStatus::Cancelled | OrderStatus::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::InventoryReserved => "InventoryReserved",
            OrderStatus::PaymentProcessed => "PaymentProcessed",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
}

impl OrderItem {
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
            total_price: unit_price.multiply(quantity),
        }
    }
}

/// An order. Created on placement, mutated only by consuming downstream
/// events, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    /// Learned from `InventoryReserved`; replayed into `InventoryReleased`
    /// when a payment failure compensates the reservation.
    pub reservation_id: Option<ReservationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Creates a pending order, totaling `quantity × unit_price` per item.
    pub fn place(customer_id: CustomerId, items: Vec<OrderItem>) -> Self {
        let total_amount = items.iter().map(|i| i.total_price).sum();
        Self {
            id: OrderId::new(),
            customer_id,
            status: OrderStatus::Pending,
            items,
            total_amount,
            reservation_id: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Applies a status transition.
    pub fn transition(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Some(Utc::now());
    }
}
