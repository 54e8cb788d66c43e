use common::{Money, OrderId, ProductId};
use event_bus::BusError;
use event_store::EventStoreError;
use thiserror::Error;

/// Errors of the order service's command and query surface.
///
/// Validation failures are rejected synchronously at the boundary and never
/// enter the event chain.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order must contain at least one item")]
    EmptyOrder,

    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    #[error("invalid unit price {price} for product {product_id}")]
    InvalidPrice { product_id: ProductId, price: Money },

    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
