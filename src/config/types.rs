use serde::Deserialize;
use std::collections::BTreeMap;

/// Browser user agent sent with every fetch unless overridden
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/42.0.2311.135 Safari/537.36 Edge/12.246";

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub dns: DnsConfig,
    #[serde(default)]
    pub sinks: SinksConfig,
    pub nats: Option<NatsConfig>,
    #[serde(rename = "search-index")]
    pub search_index: Option<SearchIndexConfig>,
    pub domains: Option<DomainsConfig>,
}

/// Batch loop behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum number of messages pulled per batch
    pub batch_size: usize,

    /// Process exactly one batch and return
    pub single_batch: bool,

    /// Pause after an error escapes the batch loop (seconds)
    pub failure_pause_secs: u64,

    /// Pause between empty batches in continuous mode (milliseconds)
    pub idle_wait_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            single_batch: false,
            failure_pause_secs: 5,
            idle_wait_ms: 1000,
        }
    }
}

/// Header set and timeouts shared by the HTTP engines
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HttpConfig {
    pub user_agent: String,

    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,

    /// Per-attempt timeout of the plain engine (seconds)
    pub fetch_timeout_secs: u64,

    /// Per-attempt timeout of the render engine (seconds)
    pub render_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: BTreeMap::new(),
            fetch_timeout_secs: 200,
            render_timeout_secs: 300,
        }
    }
}

/// Rendering API endpoint and options
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RenderConfig {
    pub api_url: String,

    /// Seconds the renderer waits after load
    pub wait: f64,

    /// Capture a HAR log
    pub har: bool,

    pub history: bool,

    /// Load images while rendering
    pub images: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            wait: 1.5,
            har: true,
            history: true,
            images: false,
        }
    }
}

/// DNS resolver options
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DnsConfig {
    pub timeout_secs: u64,
    pub attempts: usize,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            attempts: 2,
        }
    }
}

/// Which transports feed and drain the crawler
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SinksConfig {
    pub input: InputKind,
    pub output: Vec<OutputKind>,
    pub errors: ErrorKind,
}

impl Default for SinksConfig {
    fn default() -> Self {
        Self {
            input: InputKind::Nats,
            output: vec![OutputKind::SearchIndex],
            errors: ErrorKind::Queue,
        }
    }
}

/// Input queue selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
    /// NATS JetStream pull consumer
    Nats,
    /// SQLite domain list
    Domains,
}

/// Output sink selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    SearchIndex,
    Console,
    Queue,
}

/// Error sink selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Queue,
    Console,
}

/// NATS connection and subjects
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NatsConfig {
    pub url: String,

    /// JetStream stream holding crawl requests
    pub stream: String,

    pub input_subject: String,

    /// Durable pull consumer name
    pub consumer: String,

    /// How long the server waits for an ack before redelivering
    ///
    /// Must cover a whole batch: messages wait in the worker while earlier
    /// ones in the same batch are crawled.
    #[serde(default = "default_ack_wait_secs")]
    pub ack_wait_secs: u64,

    pub output_subject: Option<String>,
    pub error_subject: Option<String>,
}

fn default_ack_wait_secs() -> u64 {
    3600
}

/// Search index endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SearchIndexConfig {
    pub url: String,
    pub index: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// SQLite domain list used as an input queue
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DomainsConfig {
    pub database_path: String,

    /// Crawling type token attached to every domain
    pub crawling_type: String,
}
