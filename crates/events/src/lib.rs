//! Integration events shared by every service in the order-processing saga.
//!
//! Events are the only thing that crosses a service boundary. Each event is
//! an immutable fact with a unique id, a type tag, and a timestamp; the JSON
//! representation is a flat, self-describing envelope tagged with
//! `event_type`, so a payload can be decoded without out-of-band knowledge.

pub mod event;

pub use event::{
    DomainEvent, InventoryReleased, InventoryReservationFailed, InventoryReserved, OrderCancelled,
    OrderConfirmed, OrderLine, OrderPlaced, PaymentFailed, PaymentProcessed, ReservedItem,
};
