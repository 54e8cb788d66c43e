use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{OrderId, PaymentId};

use crate::Payment;

/// Persistence seam for payments. The relational backing store is an
/// external collaborator; the in-memory implementation below carries the
/// reference runtime and the tests.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert(&self, payment: Payment);
    async fn update(&self, payment: Payment);
    async fn get(&self, payment_id: PaymentId) -> Option<Payment>;
    async fn find_by_order(&self, order_id: OrderId) -> Vec<Payment>;
}

/// In-memory payment repository.
#[derive(Clone, Default)]
pub struct InMemoryPaymentRepository {
    payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.payments.read().unwrap().len()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn insert(&self, payment: Payment) {
        self.payments.write().unwrap().insert(payment.id, payment);
    }

    async fn update(&self, payment: Payment) {
        self.payments.write().unwrap().insert(payment.id, payment);
    }

    async fn get(&self, payment_id: PaymentId) -> Option<Payment> {
        self.payments.read().unwrap().get(&payment_id).cloned()
    }

    async fn find_by_order(&self, order_id: OrderId) -> Vec<Payment> {
        self.payments
            .read()
            .unwrap()
            .values()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use common::Money;

    use super::*;

    #[tokio::test]
    async fn insert_and_find_by_order() {
        let repo = InMemoryPaymentRepository::new();
        let order_id = OrderId::new();

        let payment = Payment::processing(order_id, Money::from_cents(5000), "CreditCard");
        let payment_id = payment.id;
        repo.insert(payment).await;

        assert_eq!(repo.count(), 1);
        assert!(repo.get(payment_id).await.is_some());
        assert_eq!(repo.find_by_order(order_id).await.len(), 1);
        assert!(repo.find_by_order(OrderId::new()).await.is_empty());
    }

    #[tokio::test]
    async fn update_replaces_the_row() {
        let repo = InMemoryPaymentRepository::new();
        let mut payment = Payment::processing(OrderId::new(), Money::from_cents(100), "CreditCard");
        repo.insert(payment.clone()).await;

        payment.complete("TXN-1");
        repo.update(payment.clone()).await;

        let stored = repo.get(payment.id).await.unwrap();
        assert_eq!(stored.transaction_id.as_deref(), Some("TXN-1"));
        assert_eq!(repo.count(), 1);
    }
}
