//! Strategy registry keyed by crawling type
//!
//! Built once at startup, checked for completeness, then shared read-only
//! with the crawling service.

use crate::crawler::strategy::{CrawlStrategy, DnsRecordsStrategy, HttpStrategy, Response};
use crate::engine::{DnsRecordsEngine, FetchEngine};
use crate::model::{CrawlTarget, CrawlingType};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by the strategy registry
#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("No strategy bound for crawling type '{0}'")]
    Unbound(CrawlingType),

    #[error("Crawling types without a strategy: {0:?}")]
    Incomplete(Vec<CrawlingType>),
}

/// Maps each crawling type to its strategy
#[derive(Default, Clone)]
pub struct StrategyLocator {
    strategies: HashMap<CrawlingType, Arc<dyn CrawlStrategy>>,
}

impl StrategyLocator {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry used in production
    ///
    /// Source and careers share the plain engine, render uses the render
    /// engine, and every DNS type shares one record engine.
    pub fn standard(
        source_engine: Arc<dyn FetchEngine>,
        render_engine: Arc<dyn FetchEngine>,
        dns_engine: DnsRecordsEngine,
    ) -> Self {
        let source: Arc<dyn CrawlStrategy> = Arc::new(HttpStrategy::new(source_engine));
        let render: Arc<dyn CrawlStrategy> = Arc::new(HttpStrategy::new(render_engine));
        let dns: Arc<dyn CrawlStrategy> = Arc::new(DnsRecordsStrategy::new(dns_engine));

        let mut locator = Self::new();
        locator.add(CrawlingType::Source, source.clone());
        locator.add(CrawlingType::Careers, source);
        locator.add(CrawlingType::Render, render);
        for crawling_type in CrawlingType::all().into_iter().filter(CrawlingType::is_dns) {
            locator.add(crawling_type, dns.clone());
        }
        locator
    }

    /// Binds a strategy, replacing any previous binding for the type
    pub fn add(&mut self, crawling_type: CrawlingType, strategy: Arc<dyn CrawlStrategy>) {
        self.strategies.insert(crawling_type, strategy);
    }

    /// Builder-style [`add`](Self::add)
    pub fn with(mut self, crawling_type: CrawlingType, strategy: Arc<dyn CrawlStrategy>) -> Self {
        self.add(crawling_type, strategy);
        self
    }

    /// Returns the strategy bound to `crawling_type`
    pub fn locate(&self, crawling_type: CrawlingType) -> Result<&dyn CrawlStrategy, LocatorError> {
        self.strategies
            .get(&crawling_type)
            .map(|strategy| strategy.as_ref())
            .ok_or(LocatorError::Unbound(crawling_type))
    }

    /// Locates the target's strategy and delegates to it
    pub async fn crawl(&self, target: &CrawlTarget) -> Result<Option<Response>, LocatorError> {
        let strategy = self.locate(target.crawling_type)?;
        Ok(strategy.crawl(target).await)
    }

    /// Fails unless every crawling type has a strategy
    pub fn validate(&self) -> Result<(), LocatorError> {
        let missing: Vec<CrawlingType> = CrawlingType::all()
            .into_iter()
            .filter(|crawling_type| !self.strategies.contains_key(crawling_type))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(LocatorError::Incomplete(missing))
        }
    }
}
