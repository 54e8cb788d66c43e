use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{CustomerId, OrderId};

use crate::Order;

/// Persistence seam for the order read state. The relational backing store
/// is an external collaborator; the in-memory implementation below carries
/// the reference runtime and the tests.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: Order);
    async fn update(&self, order: Order);
    async fn get(&self, order_id: OrderId) -> Option<Order>;
    async fn find_by_customer(&self, customer_id: CustomerId) -> Vec<Order>;
}

/// In-memory order repository.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.orders.read().unwrap().len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: Order) {
        self.orders.write().unwrap().insert(order.id, order);
    }

    async fn update(&self, order: Order) {
        self.orders.write().unwrap().insert(order.id, order);
    }

    async fn get(&self, order_id: OrderId) -> Option<Order> {
        self.orders.read().unwrap().get(&order_id).cloned()
    }

    async fn find_by_customer(&self, customer_id: CustomerId) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .unwrap()
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        orders
    }
}
