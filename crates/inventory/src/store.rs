use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId, ReservationId};
use tracing::{info, warn};

use crate::{InventoryError, Product, Reservation, ReservationLine};

/// Result of a reservation attempt. A rejection carries exactly the products
/// that were missing or short; no partial reservation ever happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved { reservation_id: ReservationId },
    Rejected { unavailable: Vec<ProductId> },
}

/// Storage seam of the reservation engine.
///
/// Implementations must make `reserve` and `release` atomic: a crash in the
/// middle of either must never leave the counters inconsistent with the
/// reservation ledger.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Inserts or replaces a product row.
    async fn upsert_product(&self, product: Product) -> Result<(), InventoryError>;

    /// Fetches a product by id.
    async fn product(&self, product_id: ProductId) -> Result<Option<Product>, InventoryError>;

    /// Atomically reserves every line or nothing.
    ///
    /// An order that already holds an active reservation gets it back
    /// unchanged, so a duplicate `OrderPlaced` delivery cannot double-book.
    async fn reserve(
        &self,
        order_id: OrderId,
        lines: &[ReservationLine],
    ) -> Result<ReserveOutcome, InventoryError>;

    /// Atomically releases the order's active reservation, if any.
    ///
    /// Idempotent: with no active reservation this is a no-op returning
    /// `None`, safe to call from a duplicate or late event.
    async fn release(&self, order_id: OrderId) -> Result<Option<ReservationId>, InventoryError>;

    /// Returns the order's active reservation, if any.
    async fn active_reservation(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Reservation>, InventoryError>;
}

#[derive(Default)]
struct InventoryState {
    products: HashMap<ProductId, Product>,
    reservations: Vec<Reservation>,
}

/// In-memory inventory store.
///
/// A single mutex over the whole state makes every operation a transaction:
/// validation and mutation happen under one guard, so concurrent reserves
/// serialize and partial updates are impossible.
#[derive(Clone, Default)]
pub struct InMemoryInventoryStore {
    state: Arc<Mutex<InventoryState>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of active reservations.
    pub fn active_reservation_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .reservations
            .iter()
            .filter(|r| r.is_active)
            .count()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn upsert_product(&self, product: Product) -> Result<(), InventoryError> {
        self.state
            .lock()
            .unwrap()
            .products
            .insert(product.id, product);
        Ok(())
    }

    async fn product(&self, product_id: ProductId) -> Result<Option<Product>, InventoryError> {
        Ok(self.state.lock().unwrap().products.get(&product_id).cloned())
    }

    async fn reserve(
        &self,
        order_id: OrderId,
        lines: &[ReservationLine],
    ) -> Result<ReserveOutcome, InventoryError> {
        let mut state = self.state.lock().unwrap();

        if let Some(existing) = state
            .reservations
            .iter()
            .find(|r| r.order_id == order_id && r.is_active)
        {
            warn!(%order_id, reservation_id = %existing.id, "order already has an active reservation");
            return Ok(ReserveOutcome::Reserved {
                reservation_id: existing.id,
            });
        }

        // Validate everything before touching anything.
        let unavailable: Vec<ProductId> = lines
            .iter()
            .filter(|line| {
                state
                    .products
                    .get(&line.product_id)
                    .is_none_or(|p| p.available_quantity < line.quantity)
            })
            .map(|line| line.product_id)
            .collect();

        if !unavailable.is_empty() {
            metrics::counter!("inventory_reservation_failures_total").increment(1);
            warn!(%order_id, ?unavailable, "reservation rejected");
            return Ok(ReserveOutcome::Rejected { unavailable });
        }

        let reservation = Reservation::new(order_id, lines.to_vec());
        let reservation_id = reservation.id;

        for line in lines {
            if let Some(product) = state.products.get_mut(&line.product_id) {
                product.available_quantity -= line.quantity;
                product.reserved_quantity += line.quantity;
                product.updated_at = Some(Utc::now());
            }
        }
        state.reservations.push(reservation);

        metrics::counter!("inventory_reservations_total").increment(1);
        info!(%order_id, %reservation_id, "inventory reserved");
        Ok(ReserveOutcome::Reserved { reservation_id })
    }

    async fn release(&self, order_id: OrderId) -> Result<Option<ReservationId>, InventoryError> {
        let mut state = self.state.lock().unwrap();

        let Some(index) = state
            .reservations
            .iter()
            .position(|r| r.order_id == order_id && r.is_active)
        else {
            warn!(%order_id, "no active reservation to release");
            return Ok(None);
        };

        let lines = state.reservations[index].items.clone();
        for line in &lines {
            if let Some(product) = state.products.get_mut(&line.product_id) {
                product.available_quantity += line.quantity;
                product.reserved_quantity -= line.quantity;
                product.updated_at = Some(Utc::now());
            }
        }

        let reservation = &mut state.reservations[index];
        reservation.is_active = false;
        reservation.released_at = Some(Utc::now());
        let reservation_id = reservation.id;

        metrics::counter!("inventory_releases_total").increment(1);
        info!(%order_id, %reservation_id, "inventory released");
        Ok(Some(reservation_id))
    }

    async fn active_reservation(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Reservation>, InventoryError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .reservations
            .iter()
            .find(|r| r.order_id == order_id && r.is_active)
            .cloned())
    }
}
