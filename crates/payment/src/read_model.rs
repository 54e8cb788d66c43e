use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use common::{Money, OrderId};

/// Order totals learned from `OrderPlaced` events.
///
/// The payment trigger (`InventoryReserved`) carries no amount, and the
/// order service's database is not reachable from here. This map is the
/// service's own projection of the one event that does carry the total.
#[derive(Clone, Default)]
pub struct OrderAmounts {
    amounts: Arc<RwLock<HashMap<OrderId, Money>>>,
}

impl OrderAmounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the total of a placed order.
    pub fn record(&self, order_id: OrderId, amount: Money) {
        self.amounts.write().unwrap().insert(order_id, amount);
    }

    /// Looks up the total of an order, if its `OrderPlaced` was seen.
    pub fn get(&self, order_id: OrderId) -> Option<Money> {
        self.amounts.read().unwrap().get(&order_id).copied()
    }
}
