use thiserror::Error;

/// Errors that can occur in the inventory service.
///
/// Note what is *not* here: insufficient stock and unknown products are
/// domain outcomes ([`crate::ReserveOutcome::Rejected`]), not errors; they
/// continue the choreography as an `InventoryReservationFailed` event.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
