use chrono::{DateTime, Utc};
use common::{CustomerId, NotificationId, OrderId};
use serde::{Deserialize, Serialize};

/// What the notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    OrderPlaced,
    OrderConfirmed,
    OrderCancelled,
}

/// How the notification is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationChannel {
    Email,
    Sms,
    Push,
}

/// Delivery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

/// A message to a customer about one of their orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub kind: NotificationKind,
    pub subject: String,
    pub message: String,
    pub channel: NotificationChannel,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Creates a pending email notification.
    pub fn email(
        order_id: OrderId,
        customer_id: CustomerId,
        kind: NotificationKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            order_id,
            customer_id,
            kind,
            subject: subject.into(),
            message: message.into(),
            channel: NotificationChannel::Email,
            status: NotificationStatus::Pending,
            created_at: Utc::now(),
            sent_at: None,
        }
    }

    /// Marks the notification as delivered.
    pub fn mark_sent(&mut self) {
        self.status = NotificationStatus::Sent;
        self.sent_at = Some(Utc::now());
    }

    /// Marks the notification as undeliverable.
    pub fn mark_failed(&mut self) {
        self.status = NotificationStatus::Failed;
    }
}
