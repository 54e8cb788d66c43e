//! Analytics service.
//!
//! Binds a single queue to the `event.*` wildcard and folds every event of
//! the system into an audit log and per-status order metrics. Read-only with
//! respect to the choreography: it never publishes.

pub mod consumer;
pub mod store;

pub use consumer::AllEventsConsumer;
pub use store::{AnalyticsStore, EventLogEntry, OrderMetrics};
