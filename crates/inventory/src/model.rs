use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, ReservationId};
use serde::{Deserialize, Serialize};

/// A product with split stock counters.
///
/// `available_quantity` is what new reservations can take;
/// `reserved_quantity` is what active reservations hold. A reserve moves
/// stock from available to reserved, a release moves it back; the sum never
/// changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub available_quantity: u32,
    pub reserved_quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Creates a product with the given starting stock and no reservations.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        sku: impl Into<String>,
        available_quantity: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            sku: sku.into(),
            available_quantity,
            reserved_quantity: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Total stock regardless of reservation state.
    pub fn total_quantity(&self) -> u32 {
        self.available_quantity + self.reserved_quantity
    }
}

/// One line of a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A multi-item hold on stock for one order.
///
/// At most one reservation per order is active at any time. Created
/// atomically with the counter decrement, deactivated atomically with the
/// counter increment on release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub order_id: OrderId,
    pub items: Vec<ReservationLine>,
    pub is_active: bool,
    pub reserved_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn new(order_id: OrderId, items: Vec<ReservationLine>) -> Self {
        Self {
            id: ReservationId::new(),
            order_id,
            items,
            is_active: true,
            reserved_at: Utc::now(),
            released_at: None,
        }
    }
}
