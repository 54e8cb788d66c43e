//! Shared kernel for the order-processing services.
//!
//! Every service owns its own entities; the only types that cross service
//! boundaries are the identifiers and the money representation defined here.

pub mod ids;
pub mod money;

pub use ids::{
    AggregateId, CustomerId, EventId, NotificationId, OrderId, PaymentId, ProductId, ReservationId,
};
pub use money::Money;
