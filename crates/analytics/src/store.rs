use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use common::{EventId, Money, OrderId};
use serde::{Deserialize, Serialize};

use events::DomainEvent;

/// One row of the audit log: which event happened to which order, when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub event_id: EventId,
    pub event_type: String,
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Aggregated order funnel counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMetrics {
    pub orders_placed: u64,
    pub orders_confirmed: u64,
    pub orders_cancelled: u64,
    pub payments_processed: u64,
    pub payments_failed: u64,
    /// Total value of all placed orders.
    pub gross_revenue: Money,
    /// Value of orders that reached payment.
    pub captured_revenue: Money,
}

#[derive(Default)]
struct AnalyticsState {
    log: Vec<EventLogEntry>,
    metrics: OrderMetrics,
}

/// In-memory analytics state: the event log plus the metrics fold.
#[derive(Clone, Default)]
pub struct AnalyticsStore {
    state: Arc<RwLock<AnalyticsState>>,
}

impl AnalyticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one event into the log and the metrics.
    pub fn apply(&self, event: &DomainEvent) {
        let mut state = self.state.write().unwrap();

        state.log.push(EventLogEntry {
            event_id: event.event_id(),
            event_type: event.event_type().to_string(),
            order_id: event.order_id(),
            occurred_at: event.occurred_at(),
        });

        match event {
            DomainEvent::OrderPlaced(e) => {
                state.metrics.orders_placed += 1;
                state.metrics.gross_revenue += e.total_amount;
            }
            DomainEvent::OrderConfirmed(_) => state.metrics.orders_confirmed += 1,
            DomainEvent::OrderCancelled(_) => state.metrics.orders_cancelled += 1,
            DomainEvent::PaymentProcessed(e) => {
                state.metrics.payments_processed += 1;
                state.metrics.captured_revenue += e.amount;
            }
            DomainEvent::PaymentFailed(_) => state.metrics.payments_failed += 1,
            DomainEvent::InventoryReserved(_)
            | DomainEvent::InventoryReservationFailed(_)
            | DomainEvent::InventoryReleased(_) => {}
        }
    }

    /// Returns a snapshot of the metrics.
    pub fn metrics(&self) -> OrderMetrics {
        self.state.read().unwrap().metrics.clone()
    }

    /// Returns the audit log for one order, in arrival order.
    pub fn order_log(&self, order_id: OrderId) -> Vec<EventLogEntry> {
        self.state
            .read()
            .unwrap()
            .log
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect()
    }

    /// Returns the size of the audit log.
    pub fn log_len(&self) -> usize {
        self.state.read().unwrap().log.len()
    }
}
