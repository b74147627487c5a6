//! Crawling service - batch consume, dispatch, publish, acknowledge
//!
//! Each message moves through decode, dispatch, transform and publish. Any
//! failure along the way sends the original body to the error sink. Either
//! way the delivery is acknowledged once, after its outcome is recorded.
//!
//! Failures that escape a message (the error sink or the queue refusing an
//! acknowledgment) abort the batch. `run` logs them, pauses, and returns so
//! process supervision can decide what happens next.

use crate::config::CrawlerConfig;
use crate::crawler::locator::{LocatorError, StrategyLocator};
use crate::crawler::transform::{to_output_record, TransformError};
use crate::model::{decode_message, CrawlingType, MessageError, OutputRecord};
use crate::output::{ErrorSink, OutputSink, SinkError};
use crate::queue::{Delivery, InputQueue};
use crate::CrawlerError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;

/// Why a single message failed
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Malformed message: {0}")]
    Decode(#[from] MessageError),

    #[error(transparent)]
    Locate(#[from] LocatorError),

    #[error("Empty response for {domain} ({crawling_type})")]
    EmptyResponse {
        domain: String,
        crawling_type: CrawlingType,
    },

    #[error("Failed to transform response: {0}")]
    Transform(#[from] TransformError),

    #[error("Failed to publish record: {0}")]
    Publish(#[from] SinkError),
}

/// Whether `run` keeps pulling batches or stops after one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Continuous,
    SingleBatch,
}

impl RunMode {
    pub fn from_single_batch(single_batch: bool) -> Self {
        if single_batch {
            Self::SingleBatch
        } else {
            Self::Continuous
        }
    }
}

/// Batch loop tuning
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub batch_size: usize,
    /// Pause after a failure escapes the batch loop
    pub failure_pause: Duration,
    /// Pause after an empty batch in continuous mode
    pub idle_wait: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

impl ServiceSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            failure_pause: Duration::from_secs(config.failure_pause_secs),
            idle_wait: Duration::from_millis(config.idle_wait_ms),
        }
    }
}

/// Counts for one processed batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Deliveries pulled from the queue
    pub received: usize,
    /// Distinct payloads among them
    pub unique: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Orchestrates the per-message pipeline over an input queue
pub struct CrawlingService {
    locator: Arc<StrategyLocator>,
    input: Arc<dyn InputQueue>,
    output: Arc<dyn OutputSink>,
    errors: Arc<dyn ErrorSink>,
    settings: ServiceSettings,
}

impl CrawlingService {
    /// Creates the service, refusing a registry with unbound crawling types
    pub fn new(
        locator: Arc<StrategyLocator>,
        input: Arc<dyn InputQueue>,
        output: Arc<dyn OutputSink>,
        errors: Arc<dyn ErrorSink>,
        settings: ServiceSettings,
    ) -> Result<Self, LocatorError> {
        locator.validate()?;
        Ok(Self {
            locator,
            input,
            output,
            errors,
            settings,
        })
    }

    /// Runs batches until the mode says stop or a failure escapes a batch
    pub async fn run(&self, mode: RunMode) -> Result<(), CrawlerError> {
        tracing::info!(
            batch_size = self.settings.batch_size,
            mode = ?mode,
            "Starting crawling service"
        );

        let mut batches = 0u64;
        loop {
            match self.process_batch().await {
                Ok(report) => {
                    batches += 1;
                    if mode == RunMode::SingleBatch {
                        tracing::info!("Single batch complete");
                        return Ok(());
                    }
                    if report.received == 0 {
                        tokio::time::sleep(self.settings.idle_wait).await;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        batches,
                        "Crawling service stopped: {}; pausing {:?}",
                        e,
                        self.settings.failure_pause
                    );
                    tokio::time::sleep(self.settings.failure_pause).await;
                    return Err(e);
                }
            }
        }
    }

    /// Pulls one batch and processes each distinct payload once
    ///
    /// A failed receive is logged and treated as an empty batch.
    pub async fn process_batch(&self) -> Result<BatchReport, CrawlerError> {
        let deliveries = match self.input.receive(self.settings.batch_size).await {
            Ok(deliveries) => deliveries,
            Err(e) => {
                tracing::warn!("Failed to receive batch: {}", e);
                Vec::new()
            }
        };

        let groups = group_by_payload(deliveries);
        let mut report = BatchReport {
            received: groups.iter().map(|(_, group)| group.len()).sum(),
            unique: groups.len(),
            ..BatchReport::default()
        };

        if report.received > report.unique {
            tracing::debug!(
                duplicates = report.received - report.unique,
                "Skipping duplicate payloads in batch"
            );
        }

        for (body, group) in &groups {
            if self.handle(body).await? {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }

            for delivery in group {
                self.input.ack(delivery).await?;
            }
        }

        if report.received > 0 {
            tracing::info!(
                received = report.received,
                succeeded = report.succeeded,
                failed = report.failed,
                "Batch processed"
            );
        }
        Ok(report)
    }

    /// Runs one payload through the pipeline and returns the published record
    pub async fn process_message(&self, body: &str) -> Result<OutputRecord, ProcessError> {
        let target = decode_message(body)?;
        let span = tracing::info_span!(
            "crawl",
            domain = %target.domain,
            crawling_type = %target.crawling_type
        );

        async {
            let response = self.locator.crawl(&target).await?.ok_or_else(|| {
                ProcessError::EmptyResponse {
                    domain: target.domain.clone(),
                    crawling_type: target.crawling_type,
                }
            })?;

            let record = to_output_record(&target, &response)?;
            self.output.put(&record).await?;
            tracing::debug!(url = %target.url_to_crawl, "Record published");
            Ok::<_, ProcessError>(record)
        }
        .instrument(span)
        .await
    }

    /// Returns whether the payload succeeded; failures go to the error sink
    async fn handle(&self, body: &str) -> Result<bool, CrawlerError> {
        match self.process_message(body).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::error!(message = %body, "Failed to process message: {}", e);
                self.errors.send(body).await?;
                Ok(false)
            }
        }
    }
}

/// Groups deliveries by identical body, preserving first-seen order
fn group_by_payload(deliveries: Vec<Delivery>) -> Vec<(String, Vec<Delivery>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Delivery>)> = Vec::new();

    for delivery in deliveries {
        match index.get(&delivery.body) {
            Some(&i) => groups[i].1.push(delivery),
            None => {
                index.insert(delivery.body.clone(), groups.len());
                groups.push((delivery.body.clone(), vec![delivery]));
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::strategy::{CrawlStrategy, Response};
    use crate::model::CrawlTarget;
    use crate::output::MemorySink;
    use crate::queue::MemoryQueue;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes the crawled URL, records every call, and fails for `fail.test`
    #[derive(Default)]
    struct EchoStrategy {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CrawlStrategy for EchoStrategy {
        async fn crawl(&self, target: &CrawlTarget) -> Option<Response> {
            self.calls.lock().unwrap().push(target.url_to_crawl.clone());
            if target.domain == "fail.test" {
                None
            } else {
                Some(Response::new(format!("content of {}", target.url_to_crawl)))
            }
        }
    }

    struct Harness {
        queue: Arc<MemoryQueue>,
        output: Arc<MemorySink>,
        errors: Arc<MemorySink>,
        strategy: Arc<EchoStrategy>,
        service: CrawlingService,
    }

    fn harness() -> Harness {
        let strategy = Arc::new(EchoStrategy::default());
        let mut locator = StrategyLocator::new();
        for crawling_type in CrawlingType::all() {
            locator.add(crawling_type, strategy.clone());
        }

        let queue = Arc::new(MemoryQueue::new());
        let output = Arc::new(MemorySink::new());
        let errors = Arc::new(MemorySink::new());
        let settings = ServiceSettings {
            batch_size: 10,
            failure_pause: Duration::from_millis(1),
            idle_wait: Duration::from_millis(1),
        };
        let service = CrawlingService::new(
            Arc::new(locator),
            queue.clone(),
            output.clone(),
            errors.clone(),
            settings,
        )
        .unwrap();

        Harness {
            queue,
            output,
            errors,
            strategy,
            service,
        }
    }

    #[test]
    fn test_new_rejects_incomplete_registry() {
        let locator = StrategyLocator::new().with(
            CrawlingType::Source,
            Arc::new(EchoStrategy::default()),
        );
        let result = CrawlingService::new(
            Arc::new(locator),
            Arc::new(MemoryQueue::new()),
            Arc::new(MemorySink::new()),
            Arc::new(MemorySink::new()),
            ServiceSettings::default(),
        );
        assert!(matches!(result, Err(LocatorError::Incomplete(missing)) if missing.len() == 8));
    }

    #[tokio::test]
    async fn test_process_message_success() {
        let h = harness();
        let record = h
            .service
            .process_message(r#"{"domain":"example.com","crawling_type":"source"}"#)
            .await
            .unwrap();

        assert_eq!(record.response, "content of example.com");
        assert_eq!(h.output.records(), vec![record]);
    }

    #[tokio::test]
    async fn test_decode_failure_never_dispatches() {
        let h = harness();
        let result = h
            .service
            .process_message(r#"{"crawling_type":"source"}"#)
            .await;

        assert!(matches!(
            result,
            Err(ProcessError::Decode(MessageError::MissingDomain))
        ));
        assert!(h.strategy.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_response_is_a_failure() {
        let h = harness();
        let result = h
            .service
            .process_message(r#"{"domain":"fail.test","crawling_type":"mx"}"#)
            .await;

        assert!(matches!(
            result,
            Err(ProcessError::EmptyResponse { crawling_type: CrawlingType::Mx, .. })
        ));
        assert!(h.output.records().is_empty());
    }

    #[tokio::test]
    async fn test_batch_routes_failures_and_acks_everything() {
        let h = harness();
        let good = r#"{"domain":"example.com","crawling_type":"txt"}"#;
        let unknown = r#"{"domain":"example.com","crawling_type":"AAAA"}"#;
        let empty = r#"{"domain":"fail.test","crawling_type":"ns"}"#;
        let ids = [h.queue.push(good), h.queue.push(unknown), h.queue.push(empty)];

        let report = h.service.process_batch().await.unwrap();

        assert_eq!(report.received, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(h.output.records().len(), 1);
        assert_eq!(h.errors.errors(), vec![unknown.to_string(), empty.to_string()]);
        assert_eq!(h.queue.acked(), ids.to_vec());
    }

    #[tokio::test]
    async fn test_duplicates_processed_once_and_all_acked() {
        let h = harness();
        let body = r#"{"domain":"example.com","crawling_type":"cname"}"#;
        let first = h.queue.push(body);
        let other = h.queue.push(r#"{"domain":"example.org","crawling_type":"cname"}"#);
        let second = h.queue.push(body);

        let report = h.service.process_batch().await.unwrap();

        assert_eq!(report.received, 3);
        assert_eq!(report.unique, 2);
        assert_eq!(h.strategy.calls.lock().unwrap().len(), 2);
        assert_eq!(h.output.records().len(), 2);

        let mut acked = h.queue.acked();
        acked.sort_unstable();
        assert_eq!(acked, vec![first, other, second]);
    }

    #[tokio::test]
    async fn test_sink_failure_routes_to_error_sink() {
        let h = harness();
        h.output.set_fail(true);
        let body = r#"{"domain":"example.com","crawling_type":"soa"}"#;
        h.queue.push(body);

        let report = h.service.process_batch().await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(h.errors.errors(), vec![body.to_string()]);
        assert_eq!(h.queue.acked().len(), 1);
    }

    #[tokio::test]
    async fn test_receive_failure_is_an_empty_batch() {
        let h = harness();
        h.queue.push(r#"{"domain":"example.com","crawling_type":"txt"}"#);
        h.queue.set_fail_receive(true);

        let report = h.service.process_batch().await.unwrap();
        assert_eq!(report, BatchReport::default());
        assert_eq!(h.queue.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_single_batch_mode_stops_after_one_batch() {
        let h = harness();
        for i in 0..15 {
            h.queue
                .push(format!(r#"{{"domain":"site{}.test","crawling_type":"txt"}}"#, i));
        }

        h.service.run(RunMode::SingleBatch).await.unwrap();

        assert_eq!(h.output.records().len(), 10);
        assert_eq!(h.queue.pending_count(), 5);
    }

    #[tokio::test]
    async fn test_error_sink_failure_escapes_run() {
        let h = harness();
        h.errors.set_fail(true);
        h.queue.push("not json");

        let result = h.service.run(RunMode::Continuous).await;

        assert!(matches!(result, Err(CrawlerError::Sink(_))));
        assert!(h.queue.acked().is_empty());
    }

    #[test]
    fn test_group_by_payload_keeps_first_seen_order() {
        let groups = group_by_payload(vec![
            Delivery::new(1, "b"),
            Delivery::new(2, "a"),
            Delivery::new(3, "b"),
        ]);
        let bodies: Vec<&str> = groups.iter().map(|(body, _)| body.as_str()).collect();
        assert_eq!(bodies, vec!["b", "a"]);
        assert_eq!(groups[0].1.len(), 2);
    }
}
