//! AMQP-backed event bus.

use chrono::Utc;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
    options::{BasicPublishOptions, ExchangeDeclareOptions},
    types::FieldTable,
};
use tokio::sync::Mutex;
use tracing::{error, info};

use async_trait::async_trait;
use events::DomainEvent;

use crate::{
    bus::{EVENT_EXCHANGE, EventBus},
    config::BusConfig,
    error::BusError,
};

struct BusState {
    connection: Connection,
    channel: Channel,
}

/// Publishes events to the durable topic exchange over RabbitMQ.
///
/// The connection is established lazily, exactly once per process, on the
/// first publish; the double-checked mutex mirrors callers racing on a cold
/// bus.
pub struct RabbitMqEventBus {
    config: BusConfig,
    state: Mutex<Option<BusState>>,
}

impl RabbitMqEventBus {
    /// Creates an unconnected bus; the first publish connects.
    pub fn new(config: BusConfig) -> Self {
        Self {
            config,
            state: Mutex::new(None),
        }
    }

    async fn channel(&self) -> Result<Channel, BusError> {
        let mut state = self.state.lock().await;
        if let Some(ref existing) = *state {
            return Ok(existing.channel.clone());
        }

        let connection =
            Connection::connect(&self.config.amqp_uri(), ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

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

        info!(
            host = %self.config.host,
            exchange = EVENT_EXCHANGE,
            "event bus initialized"
        );

        let cloned = channel.clone();
        *state = Some(BusState {
            connection,
            channel,
        });
        Ok(cloned)
    }

    /// Closes the channel and connection gracefully.
    pub async fn close(&self) -> Result<(), BusError> {
        let mut state = self.state.lock().await;
        if let Some(BusState {
            connection,
            channel,
        }) = state.take()
        {
            channel.close(200, "shutdown").await?;
            connection.close(200, "shutdown").await?;
        }
        Ok(())
    }
}

#[async_trait]
impl EventBus for RabbitMqEventBus {
    async fn publish(&self, event: &DomainEvent) -> Result<(), BusError> {
        let routing_key = event.routing_key();
        let body = serde_json::to_vec(event)?;
        let channel = self.channel().await?;

        let properties = BasicProperties::default()
            .with_delivery_mode(2)
            .with_content_type("application/json".into())
            .with_type(event.event_type().into())
            .with_message_id(event.event_id().to_string().into())
            .with_timestamp(Utc::now().timestamp() as u64);

        let result = channel
            .basic_publish(
                EVENT_EXCHANGE,
                &routing_key,
                BasicPublishOptions::default(),
                &body,
                properties,
            )
            .await;

        match result {
            Ok(_confirm) => {
                metrics::counter!("events_published_total").increment(1);
                info!(
                    event_type = event.event_type(),
                    event_id = %event.event_id(),
                    routing_key = %routing_key,
                    "published event"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    event_type = event.event_type(),
                    event_id = %event.event_id(),
                    error = %e,
                    "failed to publish event"
                );
                Err(e.into())
            }
        }
    }
}
