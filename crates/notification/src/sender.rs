use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::Notification;

/// Delivery failure reported by a sender.
#[derive(Debug, Error)]
#[error("failed to send notification: {0}")]
pub struct SendError(pub String);

/// Seam to the real delivery channel (email/SMS/push provider).
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), SendError>;
}

/// Log-only sender used by the reference runtime.
#[derive(Default)]
pub struct MockNotificationSender;

impl MockNotificationSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send(&self, notification: &Notification) -> Result<(), SendError> {
        info!(
            channel = ?notification.channel,
            customer_id = %notification.customer_id,
            kind = ?notification.kind,
            subject = %notification.subject,
            "notification sent"
        );
        metrics::counter!("notifications_sent_total").increment(1);
        Ok(())
    }
}
