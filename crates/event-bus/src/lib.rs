//! Message bus connectivity for the order-processing services.
//!
//! Everything here is about moving [`events::DomainEvent`]s through a topic
//! exchange with at-least-once semantics:
//!
//! - [`EventBus`] is the publish seam; [`RabbitMqEventBus`] implements it
//!   over AMQP, [`InMemoryEventBus`] implements it in-process for tests and
//!   single-binary runs.
//! - [`EventConsumer`] is the capability a service implements per consumed
//!   event type (queue name, bindings, handler); [`ConsumerRuntime`] drives
//!   any such consumer against the broker with a strict one-message-in-flight
//!   quota and ack/reject-without-requeue discipline.
//! - [`EventDeduplicator`] is the idempotency store consulted before a
//!   handler runs, so a redelivered event does not double-apply side effects.

pub mod bus;
pub mod config;
pub mod consumer;
pub mod dedup;
pub mod error;
pub mod memory;
pub mod rabbitmq;
pub mod topic;

pub use bus::{EVENT_EXCHANGE, EventBus};
pub use config::{BusConfig, ConfigError};
pub use consumer::{ConsumerRuntime, EventConsumer, HandlerResult, ShutdownSignal};
pub use dedup::{EventDeduplicator, InMemoryEventDeduplicator};
pub use error::BusError;
pub use memory::InMemoryEventBus;
pub use rabbitmq::RabbitMqEventBus;
pub use topic::topic_matches;
