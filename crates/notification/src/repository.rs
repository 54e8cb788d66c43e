use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;

use crate::Notification;

/// Persistence seam for notifications; in-memory for the reference runtime.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: Notification);
    async fn update(&self, notification: Notification);
    async fn find_by_order(&self, order_id: OrderId) -> Vec<Notification>;
}

/// In-memory notification repository.
#[derive(Clone, Default)]
pub struct InMemoryNotificationRepository {
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.notifications.read().unwrap().len()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.notifications.read().unwrap().clone()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert(&self, notification: Notification) {
        self.notifications.write().unwrap().push(notification);
    }

    async fn update(&self, notification: Notification) {
        let mut notifications = self.notifications.write().unwrap();
        if let Some(existing) = notifications.iter_mut().find(|n| n.id == notification.id) {
            *existing = notification;
        }
    }

    async fn find_by_order(&self, order_id: OrderId) -> Vec<Notification> {
        self.notifications
            .read()
            .unwrap()
            .iter()
            .filter(|n| n.order_id == order_id)
            .cloned()
            .collect()
    }
}
