//! Inventory service.
//!
//! Owns the stock counters and the reservation ledger. The only state in the
//! system touched by more than one logical step (reserve on `OrderPlaced`,
//! release on `InventoryReleased`), so both operations run as single atomic
//! transactions and the conservation law `available + reserved = const`
//! holds across any reserve/release pair.

pub mod consumers;
pub mod error;
pub mod model;
pub mod postgres;
pub mod store;

pub use consumers::{InventoryReleasedConsumer, OrderPlacedConsumer};
pub use error::InventoryError;
pub use model::{Product, Reservation, ReservationLine};
pub use postgres::PostgresInventoryStore;
pub use store::{InMemoryInventoryStore, InventoryStore, ReserveOutcome};
