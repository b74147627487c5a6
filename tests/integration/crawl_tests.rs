//! Integration tests for the crawling service
//!
//! These tests drive the full receive, dispatch, publish and acknowledge
//! cycle with in-memory queues and sinks, a scripted DNS resolver, and
//! wiremock servers standing in for crawled sites.

use async_trait::async_trait;
use domain_crawler::config::HttpConfig;
use domain_crawler::crawler::{CrawlingService, RunMode, ServiceSettings, StrategyLocator};
use domain_crawler::engine::{
    DnsRecordsEngine, DnsResolver, FetchEngine, FetchResponse, HttpEngine, LookupError,
};
use domain_crawler::model::{CrawlingType, DnsRecordType, OutputRecord};
use domain_crawler::output::MemorySink;
use domain_crawler::queue::MemoryQueue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Resolver answering from a fixed table and recording every query
#[derive(Default)]
struct ScriptedResolver {
    answers: HashMap<(String, DnsRecordType), Vec<String>>,
    queries: Mutex<Vec<(String, DnsRecordType)>>,
}

impl ScriptedResolver {
    fn answer(mut self, host: &str, record_type: DnsRecordType, records: &[&str]) -> Self {
        self.answers.insert(
            (host.to_string(), record_type),
            records.iter().map(|r| r.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl DnsResolver for ScriptedResolver {
    async fn query(
        &self,
        host: &str,
        record_type: DnsRecordType,
    ) -> Result<Vec<String>, LookupError> {
        self.queries
            .lock()
            .unwrap()
            .push((host.to_string(), record_type));
        self.answers
            .get(&(host.to_string(), record_type))
            .cloned()
            .ok_or_else(|| LookupError::NoAnswer(host.to_string()))
    }
}

/// Fetch engine that records requested targets and serves canned bodies
#[derive(Default)]
struct RecordingEngine {
    bodies: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl RecordingEngine {
    fn serve(mut self, target: &str, body: &str) -> Self {
        self.bodies.insert(target.to_string(), body.to_string());
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetchEngine for RecordingEngine {
    async fn fetch(&self, domain: &str) -> Option<FetchResponse> {
        self.requested.lock().unwrap().push(domain.to_string());
        self.bodies.get(domain).map(|body| FetchResponse {
            url: format!("https://{}", domain),
            status_code: 200,
            body: body.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

struct Pipeline {
    queue: Arc<MemoryQueue>,
    output: Arc<MemorySink>,
    errors: Arc<MemorySink>,
    service: CrawlingService,
}

fn settings() -> ServiceSettings {
    ServiceSettings {
        batch_size: 100,
        failure_pause: Duration::from_millis(1),
        idle_wait: Duration::from_millis(1),
    }
}

fn pipeline(
    source: Arc<dyn FetchEngine>,
    render: Arc<dyn FetchEngine>,
    resolver: Arc<dyn DnsResolver>,
) -> Pipeline {
    let locator = StrategyLocator::standard(source, render, DnsRecordsEngine::new(resolver));
    let queue = Arc::new(MemoryQueue::new());
    let output = Arc::new(MemorySink::new());
    let errors = Arc::new(MemorySink::new());

    let service = CrawlingService::new(
        Arc::new(locator),
        queue.clone(),
        output.clone(),
        errors.clone(),
        settings(),
    )
    .expect("standard registry binds every crawling type");

    Pipeline {
        queue,
        output,
        errors,
        service,
    }
}

fn dns_pipeline(resolver: Arc<ScriptedResolver>) -> Pipeline {
    pipeline(
        Arc::new(RecordingEngine::default()),
        Arc::new(RecordingEngine::default()),
        resolver,
    )
}

#[tokio::test]
async fn test_txt_records_published_end_to_end() {
    let resolver = Arc::new(ScriptedResolver::default().answer(
        "example.com",
        DnsRecordType::Txt,
        &[
            "\"v=spf1 include:_spf.example.com ~all\"",
            "\"google-site-verification=abc\"",
        ],
    ));
    let p = dns_pipeline(resolver);
    p.queue
        .push(r#"{"domain":"example.com","crawling_type":"txt"}"#);

    p.service.run(RunMode::SingleBatch).await.unwrap();

    let records = p.output.records();
    assert_eq!(records.len(), 1);
    assert_eq!(
        serde_json::to_value(&records[0]).unwrap(),
        serde_json::json!({
            "domain": "example.com",
            "crawling_type": "txt",
            "response": "v=spf1 include:_spf.example.com ~all\ngoogle-site-verification=abc"
        })
    );
    assert!(p.errors.errors().is_empty());
    assert_eq!(p.queue.acked().len(), 1);
}

#[tokio::test]
async fn test_spf_without_answer_goes_to_error_sink() {
    let resolver = Arc::new(ScriptedResolver::default());
    let p = dns_pipeline(resolver.clone());
    let original = r#"{"domain": "example.com", "crawling_type": "spf"}"#;
    p.queue.push(original);

    p.service.run(RunMode::SingleBatch).await.unwrap();

    assert!(p.output.records().is_empty());
    assert_eq!(p.errors.errors(), vec![original.to_string()]);
    assert_eq!(p.queue.acked().len(), 1);
    assert_eq!(
        resolver.queries.lock().unwrap().clone(),
        vec![("example.com".to_string(), DnsRecordType::Spf)]
    );
}

#[tokio::test]
async fn test_www_prefix_queries_bare_host() {
    let resolver = Arc::new(ScriptedResolver::default().answer(
        "example.com",
        DnsRecordType::Mx,
        &["10 mx1.example.com.", "20 mx2.example.com."],
    ));
    let p = dns_pipeline(resolver.clone());
    p.queue
        .push(r#"{"domain":"www.example.com","crawling_type":"mx"}"#);
    p.queue
        .push(r#"{"domain":"example.com","crawling_type":"mx"}"#);

    p.service.process_batch().await.unwrap();

    let queries = resolver.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0], queries[1]);

    let records = p.output.records();
    assert_eq!(records[0].domain, "www.example.com");
    assert_eq!(records[0].response, "10 mx1.example.com.\n20 mx2.example.com.");
}

#[tokio::test]
async fn test_malformed_messages_are_forwarded_verbatim() {
    let resolver = Arc::new(ScriptedResolver::default());
    let p = dns_pipeline(resolver.clone());
    let bad = [
        "",
        "{}",
        "not json at all",
        r#"{"crawling_type":"txt"}"#,
        r#"{"domain":"example.com"}"#,
        r#"{"domain":"example.com","crawling_type":"TXT"}"#,
        r#"{"domain":"example.com","crawling_type":"careers"}"#,
    ];
    for body in bad {
        p.queue.push(body);
    }

    let report = p.service.process_batch().await.unwrap();

    assert_eq!(report.failed, bad.len());
    assert_eq!(p.errors.errors(), bad.iter().map(|b| b.to_string()).collect::<Vec<_>>());
    assert!(p.output.records().is_empty());
    assert!(resolver.queries.lock().unwrap().is_empty());
    assert_eq!(p.queue.acked().len(), bad.len());
}

#[tokio::test]
async fn test_careers_fetches_url_to_crawl() {
    let source = Arc::new(
        RecordingEngine::default().serve("example.com/jobs", "<html>jobs</html>"),
    );
    let p = pipeline(
        source.clone(),
        Arc::new(RecordingEngine::default()),
        Arc::new(ScriptedResolver::default()),
    );
    p.queue.push(
        r#"{"domain":"example.com","crawling_type":"careers","url_to_crawl":"example.com/jobs"}"#,
    );

    p.service.run(RunMode::SingleBatch).await.unwrap();

    assert_eq!(source.requested(), vec!["example.com/jobs".to_string()]);
    assert_eq!(
        p.output.records(),
        vec![OutputRecord::plain(
            "example.com",
            CrawlingType::Careers,
            "<html>jobs</html>"
        )]
    );
}

#[tokio::test]
async fn test_render_payload_is_transformed() {
    let payload = serde_json::json!({
        "requestedUrl": "https://example.com/",
        "html": "<html>rendered</html>",
        "har": { "log": { "entries": [
            {
                "request": { "url": "https://example.com/" },
                "response": { "headers": [{ "name": "server", "value": "nginx" }] }
            },
            {
                "request": { "url": "https://cdn.example.com/app.js" },
                "response": { "headers": [] }
            }
        ] } }
    })
    .to_string();
    let render = Arc::new(RecordingEngine::default().serve("example.com", &payload));
    let p = pipeline(
        Arc::new(RecordingEngine::default()),
        render,
        Arc::new(ScriptedResolver::default()),
    );
    p.queue
        .push(r#"{"domain":"example.com","crawling_type":"render"}"#);

    p.service.run(RunMode::SingleBatch).await.unwrap();

    let records = p.output.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.response, "<html>rendered</html>");
    assert_eq!(record.page_url.as_deref(), Some("https://example.com/"));
    assert_eq!(
        record.web_requests.as_deref(),
        Some(r#"["https://example.com/","https://cdn.example.com/app.js"]"#)
    );
    let headers: serde_json::Value =
        serde_json::from_str(record.headers.as_deref().unwrap()).unwrap();
    assert_eq!(headers[0]["value"], "nginx");
}

#[tokio::test]
async fn test_duplicate_payloads_crawled_once() {
    let source = Arc::new(RecordingEngine::default().serve("example.com", "<html/>"));
    let p = pipeline(
        source.clone(),
        Arc::new(RecordingEngine::default()),
        Arc::new(ScriptedResolver::default()),
    );
    let body = r#"{"domain":"example.com","crawling_type":"source"}"#;
    let ids = [p.queue.push(body), p.queue.push(body), p.queue.push(body)];

    let report = p.service.process_batch().await.unwrap();

    assert_eq!(report.received, 3);
    assert_eq!(report.unique, 1);
    assert_eq!(source.requested().len(), 1);
    assert_eq!(p.output.records().len(), 1);
    assert_eq!(p.queue.acked(), ids.to_vec());
}

#[tokio::test]
async fn test_source_page_fetched_over_http_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>home</html>"))
        .mount(&server)
        .await;
    let domain = server.uri().trim_start_matches("http://").to_string();

    let http = HttpConfig {
        fetch_timeout_secs: 5,
        ..HttpConfig::default()
    };
    let engine = Arc::new(HttpEngine::new(&http).unwrap());
    let locator = StrategyLocator::standard(
        engine.clone(),
        engine,
        DnsRecordsEngine::new(Arc::new(ScriptedResolver::default())),
    );

    let queue = Arc::new(MemoryQueue::new());
    let output = Arc::new(MemorySink::new());
    let errors = Arc::new(MemorySink::new());
    let service = CrawlingService::new(
        Arc::new(locator),
        queue.clone(),
        output.clone(),
        errors.clone(),
        settings(),
    )
    .unwrap();

    queue.push(format!(
        r#"{{"domain":"{}","crawling_type":"source"}}"#,
        domain
    ));
    service.run(RunMode::SingleBatch).await.unwrap();

    let records = output.records();
    assert_eq!(records.len(), 1, "errors: {:?}", errors.errors());
    assert_eq!(records[0].response, "<html>home</html>");
}

#[tokio::test]
async fn test_continuous_mode_returns_after_error_sink_failure() {
    let p = dns_pipeline(Arc::new(ScriptedResolver::default()));
    p.errors.set_fail(true);
    p.queue
        .push(r#"{"domain":"example.com","crawling_type":"ns"}"#);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        p.service.run(RunMode::Continuous),
    )
    .await
    .expect("run returns instead of looping");

    assert!(result.is_err());
    assert!(p.queue.acked().is_empty());
}
