use crate::model::OutputRecord;
use crate::output::traits::{OutputSink, SinkError, SinkResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Fans a record out to several sinks
///
/// Every sink is attempted even if an earlier one fails; the first failure
/// is reported along with the failure count.
pub struct CompositeSink {
    sinks: Vec<Arc<dyn OutputSink>>,
}

impl CompositeSink {
    pub fn new(sinks: Vec<Arc<dyn OutputSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl OutputSink for CompositeSink {
    async fn put(&self, record: &OutputRecord) -> SinkResult<()> {
        let mut first = None;
        let mut failed = 0;

        for sink in &self.sinks {
            if let Err(e) = sink.put(record).await {
                failed += 1;
                first.get_or_insert(e);
            }
        }

        match first {
            None => Ok(()),
            Some(e) if self.sinks.len() == 1 => Err(e),
            Some(e) => Err(SinkError::Partial {
                failed,
                total: self.sinks.len(),
                first: Box::new(e),
            }),
        }
    }
}
