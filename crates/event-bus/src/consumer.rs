//! Shared consumer runtime.
//!
//! A service implements [`EventConsumer`] once per event type it consumes;
//! the runtime owns everything broker-facing: topology declaration, the
//! one-message-in-flight quota, deserialization, deduplication, and the
//! acknowledge/reject discipline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use lapin::{
    Channel, Connection, ConnectionProperties, ExchangeKind,
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicQosOptions, BasicRejectOptions,
        ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
    },
    types::FieldTable,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use events::DomainEvent;

use crate::{
    bus::EVENT_EXCHANGE,
    config::BusConfig,
    dedup::EventDeduplicator,
    error::BusError,
};

/// How often and how long to retry the initial broker connection after the
/// startup grace period has passed.
const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Result of handling one event. Any error rejects the message without
/// requeue: the event is dropped, not retried and not dead-lettered.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Capability contract a service implements per consumed event type.
#[async_trait]
pub trait EventConsumer: Send + Sync {
    /// Durable queue this consumer reads from. Also the deduplication scope.
    fn queue_name(&self) -> &str;

    /// Routing-key patterns to bind (exact keys or wildcards).
    fn routing_keys(&self) -> &[&str];

    /// Applies the event. Domain failures must be expressed as new events,
    /// not as errors; an `Err` here means the message is dropped.
    async fn handle(&self, event: DomainEvent) -> HandlerResult;
}

/// Broadcast used to stop every consumer runtime at shutdown.
#[derive(Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Returns a receiver that resolves when shutdown is requested.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Requests shutdown of every subscribed runtime.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns one background task per consumer against the broker.
pub struct ConsumerRuntime {
    config: BusConfig,
    dedup: Arc<dyn EventDeduplicator>,
}

impl ConsumerRuntime {
    pub fn new(config: BusConfig, dedup: Arc<dyn EventDeduplicator>) -> Self {
        Self { config, dedup }
    }

    /// Starts a long-lived task driving the consumer. The task ends when the
    /// shutdown signal fires or the broker connection dies.
    pub fn spawn(
        &self,
        consumer: Arc<dyn EventConsumer>,
        shutdown: &ShutdownSignal,
    ) -> JoinHandle<()> {
        let config = self.config.clone();
        let dedup = self.dedup.clone();
        let rx = shutdown.subscribe();

        tokio::spawn(async move {
            let queue = consumer.queue_name().to_string();
            if let Err(e) = drive(config, consumer, dedup, rx).await {
                error!(queue = %queue, error = %e, "consumer runtime terminated");
            }
        })
    }
}

async fn drive(
    config: BusConfig,
    consumer: Arc<dyn EventConsumer>,
    dedup: Arc<dyn EventDeduplicator>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), BusError> {
    // Give the broker a bounded head start on cold deployments.
    tokio::time::sleep(config.startup_grace).await;

    let connection = connect_with_retry(&config).await?;
    let channel = connection.create_channel().await?;
    let queue = consumer.queue_name().to_string();

    declare_topology(&channel, &queue, consumer.routing_keys()).await?;

    // One unacknowledged message at a time: handling within this queue is
    // sequential; there is no ordering guarantee across queues.
    channel.basic_qos(1, BasicQosOptions::default()).await?;

    let consumer_tag = format!("{queue}-{}", Uuid::new_v4());
    let mut deliveries = channel
        .basic_consume(
            &queue,
            &consumer_tag,
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await?;

    info!(
        queue = %queue,
        routing_keys = ?consumer.routing_keys(),
        "consumer started"
    );

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!(queue = %queue, "consumer shutting down");
                break;
            }
            delivery = deliveries.next() => match delivery {
                Some(Ok(delivery)) => {
                    let tag = delivery.delivery_tag;
                    match serde_json::from_slice::<DomainEvent>(&delivery.data) {
                        Ok(event) => {
                            process(&channel, &*consumer, &*dedup, &queue, tag, event).await?;
                        }
                        Err(e) => {
                            // Not retryable: a payload that does not decode
                            // now will not decode later either.
                            warn!(queue = %queue, error = %e, "dropping undecodable message");
                            metrics::counter!("events_dropped_total").increment(1);
                            channel
                                .basic_reject(tag, BasicRejectOptions { requeue: false })
                                .await?;
                        }
                    }
                }
                Some(Err(e)) => {
                    error!(queue = %queue, error = %e, "consumer stream error");
                    break;
                }
                None => {
                    debug!(queue = %queue, "consumer stream ended");
                    break;
                }
            }
        }
    }

    channel.close(200, "shutdown").await?;
    connection.close(200, "shutdown").await?;
    Ok(())
}

async fn process(
    channel: &Channel,
    consumer: &dyn EventConsumer,
    dedup: &dyn EventDeduplicator,
    queue: &str,
    tag: u64,
    event: DomainEvent,
) -> Result<(), BusError> {
    let event_id = event.event_id();
    let event_type = event.event_type();

    if dedup.already_processed(queue, event_id).await {
        debug!(queue = %queue, %event_id, "skipping duplicate delivery");
        channel.basic_ack(tag, BasicAckOptions::default()).await?;
        return Ok(());
    }

    match consumer.handle(event).await {
        Ok(()) => {
            dedup.mark_processed(queue, event_id).await;
            channel.basic_ack(tag, BasicAckOptions::default()).await?;
            metrics::counter!("events_consumed_total").increment(1);
            info!(queue = %queue, event_type, %event_id, "processed event");
        }
        Err(e) => {
            error!(queue = %queue, event_type, %event_id, error = %e, "handler failed, dropping event");
            metrics::counter!("events_dropped_total").increment(1);
            channel
                .basic_reject(tag, BasicRejectOptions { requeue: false })
                .await?;
        }
    }
    Ok(())
}

async fn declare_topology(
    channel: &Channel,
    queue: &str,
    routing_keys: &[&str],
) -> Result<(), BusError> {
    channel
        .exchange_declare(
            EVENT_EXCHANGE,
            ExchangeKind::Topic,
            ExchangeDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await?;

    channel
        .queue_declare(
            queue,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await?;

    for routing_key in routing_keys {
        channel
            .queue_bind(
                queue,
                EVENT_EXCHANGE,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
    }

    Ok(())
}

async fn connect_with_retry(config: &BusConfig) -> Result<Connection, BusError> {
    let mut attempt = 0;
    loop {
        match Connection::connect(&config.amqp_uri(), ConnectionProperties::default()).await {
            Ok(connection) => return Ok(connection),
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                attempt += 1;
                warn!(
                    host = %config.host,
                    attempt,
                    error = %e,
                    "broker unavailable, retrying"
                );
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
