use crate::model::OutputRecord;
use crate::output::traits::{ErrorSink, OutputSink, SinkError, SinkResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Collects records and failed messages in memory
///
/// Used by dry runs and tests. Can be told to fail so callers can exercise
/// their error paths.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<OutputRecord>>,
    errors: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `put` and `send` fail
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<OutputRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn check(&self) -> SinkResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SinkError::Write("memory sink set to fail".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn put(&self, record: &OutputRecord) -> SinkResult<()> {
        self.check()?;
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl ErrorSink for MemorySink {
    async fn send(&self, message: &str) -> SinkResult<()> {
        self.check()?;
        self.errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
        Ok(())
    }
}
