//! Notification service.
//!
//! Stateless fan-out of human-readable messages on order lifecycle events.
//! `OrderConfirmed` and `OrderCancelled` carry no customer id, so the
//! service keeps its own order → customer map fed from `OrderPlaced`.

pub mod consumers;
pub mod model;
pub mod read_model;
pub mod repository;
pub mod sender;

pub use consumers::{
    NotificationContext, OrderCancelledConsumer, OrderConfirmedConsumer, OrderPlacedConsumer,
};
pub use model::{Notification, NotificationChannel, NotificationKind, NotificationStatus};
pub use read_model::OrderCustomers;
pub use repository::{InMemoryNotificationRepository, NotificationRepository};
pub use sender::{MockNotificationSender, NotificationSender, SendError};
