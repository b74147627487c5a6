//! Crawling strategies
//!
//! A strategy binds a crawling type to an engine and the URL construction
//! rule for that type.

use crate::engine::{DnsRecordsEngine, FetchEngine};
use crate::model::CrawlTarget;
use async_trait::async_trait;
use std::sync::Arc;

/// Normalized strategy result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub text: String,
}

impl Response {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Type-specific crawl behavior
///
/// Implementations never fail loudly: engine failures are logged where they
/// happen and surface here as `None`.
#[async_trait]
pub trait CrawlStrategy: Send + Sync {
    async fn crawl(&self, target: &CrawlTarget) -> Option<Response>;
}

/// Delegates to an HTTP engine using `url_to_crawl` as the fetch target
///
/// Serves source, render and careers.
pub struct HttpStrategy {
    engine: Arc<dyn FetchEngine>,
}

impl HttpStrategy {
    pub fn new(engine: Arc<dyn FetchEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CrawlStrategy for HttpStrategy {
    async fn crawl(&self, target: &CrawlTarget) -> Option<Response> {
        self.engine
            .fetch(&target.url_to_crawl)
            .await
            .map(|response| Response::new(response.body))
    }
}

/// Looks up the DNS records named by the target's crawling type
pub struct DnsRecordsStrategy {
    engine: DnsRecordsEngine,
}

impl DnsRecordsStrategy {
    pub fn new(engine: DnsRecordsEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl CrawlStrategy for DnsRecordsStrategy {
    async fn crawl(&self, target: &CrawlTarget) -> Option<Response> {
        let Some(record_type) = target.crawling_type.dns_record_type() else {
            tracing::error!(
                domain = %target.domain,
                crawling_type = %target.crawling_type,
                "Crawling type has no DNS record kind"
            );
            return None;
        };

        // The engine only keeps the hostname, so the scheme is never queried.
        let url = format!("https://{}", target.url_to_crawl);
        self.engine.lookup(&url, record_type).await.map(Response::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{DnsResolver, FetchResponse, LookupError};
    use crate::model::{CrawlingType, DnsRecordType};
    use std::sync::Mutex;

    struct FixedEngine {
        requested: Mutex<Vec<String>>,
        body: Option<&'static str>,
    }

    #[async_trait]
    impl FetchEngine for FixedEngine {
        async fn fetch(&self, domain: &str) -> Option<FetchResponse> {
            self.requested.lock().unwrap().push(domain.to_string());
            self.body.map(|body| FetchResponse {
                url: format!("https://{}", domain),
                status_code: 200,
                body: body.to_string(),
            })
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct FixedResolver {
        queries: Mutex<Vec<(String, DnsRecordType)>>,
    }

    #[async_trait]
    impl DnsResolver for FixedResolver {
        async fn query(
            &self,
            host: &str,
            record_type: DnsRecordType,
        ) -> Result<Vec<String>, LookupError> {
            self.queries
                .lock()
                .unwrap()
                .push((host.to_string(), record_type));
            Ok(vec!["ns1.example.com.".to_string()])
        }
    }

    #[tokio::test]
    async fn test_careers_fetches_url_to_crawl() {
        let engine = Arc::new(FixedEngine {
            requested: Mutex::new(Vec::new()),
            body: Some("<html>jobs</html>"),
        });
        let strategy = HttpStrategy::new(engine.clone());

        let target = CrawlTarget::careers("example.com", "jobs.example.org/open");
        let response = strategy.crawl(&target).await.unwrap();

        assert_eq!(response.text, "<html>jobs</html>");
        assert_eq!(
            *engine.requested.lock().unwrap(),
            vec!["jobs.example.org/open".to_string()]
        );
    }

    #[tokio::test]
    async fn test_absent_engine_result_propagates() {
        let engine = Arc::new(FixedEngine {
            requested: Mutex::new(Vec::new()),
            body: None,
        });
        let strategy = HttpStrategy::new(engine);
        let target = CrawlTarget::new("example.com", CrawlingType::Source);
        assert!(strategy.crawl(&target).await.is_none());
    }

    #[tokio::test]
    async fn test_dns_strategy_uses_crawling_type_as_record_type() {
        let resolver = Arc::new(FixedResolver {
            queries: Mutex::new(Vec::new()),
        });
        let strategy = DnsRecordsStrategy::new(DnsRecordsEngine::new(resolver.clone()));

        let target = CrawlTarget::new("www.example.com", CrawlingType::Ns);
        let response = strategy.crawl(&target).await.unwrap();

        assert_eq!(response.text, "ns1.example.com.");
        assert_eq!(
            *resolver.queries.lock().unwrap(),
            vec![("example.com".to_string(), DnsRecordType::Ns)]
        );
    }

    #[tokio::test]
    async fn test_dns_strategy_rejects_http_types() {
        let resolver = Arc::new(FixedResolver {
            queries: Mutex::new(Vec::new()),
        });
        let strategy = DnsRecordsStrategy::new(DnsRecordsEngine::new(resolver.clone()));

        let target = CrawlTarget::new("example.com", CrawlingType::Source);
        assert!(strategy.crawl(&target).await.is_none());
        assert!(resolver.queries.lock().unwrap().is_empty());
    }
}
