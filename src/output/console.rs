use crate::model::OutputRecord;
use crate::output::traits::{ErrorSink, OutputSink, SinkError, SinkResult};
use async_trait::async_trait;
use std::io::Write;

/// Prints records and failed messages to stdout, one JSON document per line
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ConsoleSink {
    fn write_line(line: &str) -> SinkResult<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", line).map_err(|e| SinkError::Write(e.to_string()))
    }
}

#[async_trait]
impl OutputSink for ConsoleSink {
    async fn put(&self, record: &OutputRecord) -> SinkResult<()> {
        Self::write_line(&serde_json::to_string(record)?)
    }
}

#[async_trait]
impl ErrorSink for ConsoleSink {
    async fn send(&self, message: &str) -> SinkResult<()> {
        Self::write_line(message)
    }
}
