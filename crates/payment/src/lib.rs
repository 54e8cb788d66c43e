//! Payment service.
//!
//! Charges an order once its inventory is reserved. The trigger event does
//! not carry the amount, so the service keeps a small read model of order
//! totals fed from `OrderPlaced` instead of reaching into another service's
//! database.

pub mod consumers;
pub mod gateway;
pub mod model;
pub mod read_model;
pub mod repository;

pub use consumers::{InventoryReservedConsumer, OrderPlacedConsumer};
pub use gateway::{GatewayOutcome, MockPaymentGateway, PaymentGateway};
pub use model::{Payment, PaymentStatus};
pub use read_model::OrderAmounts;
pub use repository::{InMemoryPaymentRepository, PaymentRepository};
