//! Sink traits and error types

use crate::model::OutputRecord;
use crate::queue::QueueError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while publishing
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Search index request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search index rejected document {id} with status {status}: {body}")]
    Rejected { id: String, status: u16, body: String },

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("{failed} of {total} sinks failed, first error: {first}")]
    Partial {
        failed: usize,
        total: usize,
        first: Box<SinkError>,
    },
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for successfully processed records
#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn put(&self, record: &OutputRecord) -> SinkResult<()>;
}

/// Destination for messages that failed processing
///
/// Receives the original message body verbatim.
#[async_trait]
pub trait ErrorSink: Send + Sync {
    async fn send(&self, message: &str) -> SinkResult<()>;
}
