use thiserror::Error;

/// Errors that can occur when talking to the message bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The AMQP client reported a failure.
    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),

    /// An event could not be serialized for publishing.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
