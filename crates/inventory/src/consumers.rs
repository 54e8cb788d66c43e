//! Inventory-side consumers of the choreography.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use event_bus::{EventBus, EventConsumer, HandlerResult};
use events::{DomainEvent, ReservedItem};

use crate::{ReservationLine, store::{InventoryStore, ReserveOutcome}};

/// Reacts to `OrderPlaced`: attempts the reservation and answers with
/// `InventoryReserved` or `InventoryReservationFailed`.
pub struct OrderPlacedConsumer {
    store: Arc<dyn InventoryStore>,
    bus: Arc<dyn EventBus>,
}

impl OrderPlacedConsumer {
    pub fn new(store: Arc<dyn InventoryStore>, bus: Arc<dyn EventBus>) -> Self {
        Self { store, bus }
    }
}

#[async_trait]
impl EventConsumer for OrderPlacedConsumer {
    fn queue_name(&self) -> &str {
        "inventory-service-orderplaced"
    }

    fn routing_keys(&self) -> &[&str] {
        &["event.orderplaced"]
    }

    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type()))]
    async fn handle(&self, event: DomainEvent) -> HandlerResult {
        let DomainEvent::OrderPlaced(placed) = event else {
            warn!("unexpected event on inventory queue, ignoring");
            return Ok(());
        };

        let lines: Vec<ReservationLine> = placed
            .items
            .iter()
            .map(|item| ReservationLine {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect();

        match self.store.reserve(placed.order_id, &lines).await? {
            ReserveOutcome::Reserved { reservation_id } => {
                let reserved_items: Vec<ReservedItem> = placed
                    .items
                    .iter()
                    .map(|item| ReservedItem {
                        product_id: item.product_id,
                        quantity: item.quantity,
                    })
                    .collect();

                self.bus
                    .publish(&DomainEvent::inventory_reserved(
                        placed.order_id,
                        reservation_id,
                        reserved_items,
                    ))
                    .await?;
            }
            ReserveOutcome::Rejected { unavailable } => {
                self.bus
                    .publish(&DomainEvent::inventory_reservation_failed(
                        placed.order_id,
                        "Insufficient inventory",
                        unavailable,
                    ))
                    .await?;
            }
        }

        Ok(())
    }
}

/// Reacts to `InventoryReleased`: compensates a reservation after a payment
/// failure. A duplicate or late event finds no active reservation and is a
/// no-op.
pub struct InventoryReleasedConsumer {
    store: Arc<dyn InventoryStore>,
}

impl InventoryReleasedConsumer {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventConsumer for InventoryReleasedConsumer {
    fn queue_name(&self) -> &str {
        "inventory-service-inventoryreleased"
    }

    fn routing_keys(&self) -> &[&str] {
        &["event.inventoryreleased"]
    }

    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type()))]
    async fn handle(&self, event: DomainEvent) -> HandlerResult {
        let DomainEvent::InventoryReleased(released) = event else {
            warn!("unexpected event on inventory queue, ignoring");
            return Ok(());
        };

        match self.store.release(released.order_id).await? {
            Some(reservation_id) => {
                info!(order_id = %released.order_id, %reservation_id, "reservation released");
            }
            None => {
                info!(order_id = %released.order_id, "nothing to release");
            }
        }

        Ok(())
    }
}
