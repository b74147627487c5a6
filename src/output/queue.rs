use crate::model::OutputRecord;
use crate::output::traits::{ErrorSink, OutputSink, SinkResult};
use crate::queue::Publisher;
use async_trait::async_trait;
use std::sync::Arc;

/// Publishes to a queue subject
///
/// Records are published as JSON; failed messages are published verbatim.
pub struct QueueSink {
    publisher: Arc<dyn Publisher>,
    subject: String,
}

impl QueueSink {
    pub fn new(publisher: Arc<dyn Publisher>, subject: impl Into<String>) -> Self {
        Self {
            publisher,
            subject: subject.into(),
        }
    }
}

#[async_trait]
impl OutputSink for QueueSink {
    async fn put(&self, record: &OutputRecord) -> SinkResult<()> {
        let payload = serde_json::to_string(record)?;
        self.publisher.publish(&self.subject, payload).await?;
        Ok(())
    }
}

#[async_trait]
impl ErrorSink for QueueSink {
    async fn send(&self, message: &str) -> SinkResult<()> {
        self.publisher
            .publish(&self.subject, message.to_string())
            .await?;
        Ok(())
    }
}
