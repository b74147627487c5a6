//! Queue traits and error types

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to a queue
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Failed to connect to queue: {0}")]
    Connect(String),

    #[error("Failed to receive messages: {0}")]
    Receive(String),

    #[error("Failed to acknowledge message {id}: {message}")]
    Ack { id: u64, message: String },

    #[error("Failed to publish to '{subject}': {message}")]
    Publish { subject: String, message: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// A message pulled from an input queue
///
/// `id` identifies the delivery for acknowledgment; `body` is the raw
/// payload exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub id: u64,
    pub body: String,
}

impl Delivery {
    pub fn new(id: u64, body: impl Into<String>) -> Self {
        Self {
            id,
            body: body.into(),
        }
    }
}

/// Source of crawl requests
#[async_trait]
pub trait InputQueue: Send + Sync {
    /// Pulls up to `max_messages` messages, returning early when the queue is empty
    async fn receive(&self, max_messages: usize) -> QueueResult<Vec<Delivery>>;

    /// Acknowledges a delivery so it is not redelivered
    async fn ack(&self, delivery: &Delivery) -> QueueResult<()>;
}

/// Publishes raw payloads to a subject
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, subject: &str, payload: String) -> QueueResult<()>;
}
