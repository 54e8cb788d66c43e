//! Order service.
//!
//! Owns the order aggregate and its status state machine. Placement is the
//! only synchronous command; every later transition is driven by consuming
//! a downstream event, and each transition publishes the next event in the
//! chain. There is no coordinator: the saga emerges from these reactions.

pub mod consumers;
pub mod error;
pub mod event_log;
pub mod model;
pub mod repository;
pub mod service;

pub use consumers::{
    InventoryReservationFailedConsumer, InventoryReservedConsumer, OrderContext,
    PaymentFailedConsumer, PaymentProcessedConsumer,
};
pub use error::OrderError;
pub use event_log::OrderEventLog;
pub use model::{Order, OrderItem, OrderStatus};
pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use service::{OrderService, PlaceOrderItem, PlacedOrder};
