//! Crawl dispatch and orchestration
//!
//! This module contains:
//! - Crawling strategies binding a crawling type to an engine
//! - The strategy registry keyed by crawling type
//! - Render payload transformation into output records
//! - The batch-consuming crawling service

mod locator;
mod service;
mod strategy;
mod transform;

pub use locator::{LocatorError, StrategyLocator};
pub use service::{BatchReport, CrawlingService, ProcessError, RunMode, ServiceSettings};
pub use strategy::{CrawlStrategy, DnsRecordsStrategy, HttpStrategy, Response};
pub use transform::{to_output_record, TransformError};
