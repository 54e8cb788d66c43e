use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use common::{CustomerId, OrderId};

/// Order → customer mapping learned from `OrderPlaced` events.
///
/// The confirmation and cancellation events carry no customer id; this map
/// is how the service knows whom to notify without reaching into another
/// service's data.
#[derive(Clone, Default)]
pub struct OrderCustomers {
    customers: Arc<RwLock<HashMap<OrderId, CustomerId>>>,
}

impl OrderCustomers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, order_id: OrderId, customer_id: CustomerId) {
        self.customers.write().unwrap().insert(order_id, customer_id);
    }

    pub fn get(&self, order_id: OrderId) -> Option<CustomerId> {
        self.customers.read().unwrap().get(&order_id).copied()
    }
}
