//! Domain crawler main entry point
//!
//! This is the command-line interface for the queue-driven domain crawler.

use anyhow::{anyhow, Context};
use clap::Parser;
use domain_crawler::config::{
    compute_config_hash, read_config, validate, Config, ErrorKind, InputKind, OutputKind,
};
use domain_crawler::crawler::{CrawlingService, RunMode, ServiceSettings, StrategyLocator};
use domain_crawler::engine::{DnsRecordsEngine, HickoryResolver, HttpEngine, RenderEngine};
use domain_crawler::model::CrawlingType;
use domain_crawler::output::{
    CompositeSink, ConsoleSink, ErrorSink, OutputSink, QueueSink, SearchIndexSink,
};
use domain_crawler::queue::{DomainListQueue, InputQueue, NatsQueue};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Domain crawler: fetches pages, rendered pages and DNS records for queued domains
///
/// Crawl requests are pulled from the input queue in batches. Each is
/// dispatched by its crawling type, and the result is published to the
/// output sinks. Failed requests go verbatim to the error sink.
#[derive(Parser, Debug)]
#[command(name = "domain-crawler")]
#[command(version = "1.0.0")]
#[command(about = "Queue-driven domain crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Input queue, overriding [sinks] input
    #[arg(short, long, value_enum)]
    input: Option<InputKind>,

    /// Output sink, repeatable, overriding [sinks] output
    #[arg(short, long, value_enum)]
    output: Vec<OutputKind>,

    /// Error sink, overriding [sinks] errors
    #[arg(short, long, value_enum)]
    error: Option<ErrorKind>,

    /// Maximum messages per batch, overriding [crawler] batch-size
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Process one batch and exit
    #[arg(long)]
    single_batch: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Validate config and show the wiring without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, cli.log_json);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = read_config(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let config_hash = compute_config_hash(&cli.config)?;

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let locator = build_locator(&config)?;
    locator
        .validate()
        .context("Strategy registry is incomplete")?;

    if cli.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, locator).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, json: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("domain_crawler=info,warn"),
            1 => EnvFilter::new("domain_crawler=debug,info"),
            2 => EnvFilter::new("domain_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Layers command-line flags over the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(input) = cli.input {
        config.sinks.input = input;
    }
    if !cli.output.is_empty() {
        config.sinks.output = cli.output.clone();
    }
    if let Some(errors) = cli.error {
        config.sinks.errors = errors;
    }
    if let Some(batch_size) = cli.batch_size {
        config.crawler.batch_size = batch_size;
    }
    if cli.single_batch {
        config.crawler.single_batch = true;
    }
}

/// Binds every crawling type to its engine
fn build_locator(config: &Config) -> anyhow::Result<StrategyLocator> {
    let source = HttpEngine::new(&config.http).context("Failed to build HTTP engine")?;
    let render = RenderEngine::new(
        config.render.api_url.clone(),
        &config.http,
        config.render.clone(),
    )
    .context("Failed to build render engine")?;
    let dns = DnsRecordsEngine::new(Arc::new(HickoryResolver::new(&config.dns)));

    Ok(StrategyLocator::standard(
        Arc::new(source),
        Arc::new(render),
        dns,
    ))
}

/// Handles the --dry-run mode: shows how the crawler would be wired
fn print_dry_run(config: &Config) {
    println!("=== Domain Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Single batch: {}", config.crawler.single_batch);
    println!("  Failure pause: {}s", config.crawler.failure_pause_secs);

    println!("\nEngines:");
    println!("  Fetch timeout: {}s", config.http.fetch_timeout_secs);
    println!("  Render API: {}", config.render.api_url);
    println!("  Render timeout: {}s", config.http.render_timeout_secs);
    println!(
        "  DNS: {}s timeout, {} attempts",
        config.dns.timeout_secs, config.dns.attempts
    );

    println!("\nStrategies:");
    for crawling_type in CrawlingType::all() {
        let engine = match crawling_type {
            CrawlingType::Source | CrawlingType::Careers => "http",
            CrawlingType::Render => "render",
            _ => "dns",
        };
        println!(
            "  - {:<8} -> {:<6} (index field: {})",
            crawling_type,
            engine,
            crawling_type.index_field()
        );
    }

    println!("\nSinks:");
    println!("  Input: {:?}", config.sinks.input);
    println!("  Output: {:?}", config.sinks.output);
    println!("  Errors: {:?}", config.sinks.errors);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, locator: StrategyLocator) -> anyhow::Result<()> {
    let nats = connect_nats_if_needed(&config).await?;

    let input = build_input(&config, nats.clone())?;
    let output = build_output(&config, nats.clone())?;
    let errors = build_errors(&config, nats)?;

    let service = CrawlingService::new(
        Arc::new(locator),
        input,
        output,
        errors,
        ServiceSettings::from_config(&config.crawler),
    )?;

    let mode = RunMode::from_single_batch(config.crawler.single_batch);
    tokio::select! {
        result = service.run(mode) => {
            match result {
                Ok(()) => {
                    tracing::info!("Crawler finished");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("Crawler failed: {}", e);
                    Err(e.into())
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            Ok(())
        }
    }
}

/// Opens one NATS connection shared by every transport that needs it
async fn connect_nats_if_needed(config: &Config) -> anyhow::Result<Option<Arc<NatsQueue>>> {
    let needed = config.sinks.input == InputKind::Nats
        || config.sinks.output.contains(&OutputKind::Queue)
        || config.sinks.errors == ErrorKind::Queue;
    if !needed {
        return Ok(None);
    }

    let nats_config = config
        .nats
        .as_ref()
        .ok_or_else(|| anyhow!("[nats] section is required"))?;
    let queue = NatsQueue::connect(nats_config)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", nats_config.url))?;
    Ok(Some(Arc::new(queue)))
}

fn build_input(
    config: &Config,
    nats: Option<Arc<NatsQueue>>,
) -> anyhow::Result<Arc<dyn InputQueue>> {
    match config.sinks.input {
        InputKind::Nats => {
            let queue = nats.ok_or_else(|| anyhow!("NATS input selected without a connection"))?;
            Ok(queue)
        }
        InputKind::Domains => {
            let domains = config
                .domains
                .as_ref()
                .ok_or_else(|| anyhow!("[domains] section is required"))?;
            let crawling_type: CrawlingType = domains.crawling_type.parse()?;
            let queue = DomainListQueue::open(Path::new(&domains.database_path), crawling_type)
                .with_context(|| format!("Failed to open {}", domains.database_path))?;
            tracing::info!(
                remaining = queue.remaining()?,
                crawling_type = %crawling_type,
                "Reading domains from {}",
                domains.database_path
            );
            Ok(Arc::new(queue))
        }
    }
}

fn build_output(
    config: &Config,
    nats: Option<Arc<NatsQueue>>,
) -> anyhow::Result<Arc<dyn OutputSink>> {
    let mut sinks: Vec<Arc<dyn OutputSink>> = Vec::new();

    for kind in &config.sinks.output {
        let sink: Arc<dyn OutputSink> = match kind {
            OutputKind::Console => Arc::new(ConsoleSink),
            OutputKind::SearchIndex => {
                let index = config
                    .search_index
                    .as_ref()
                    .ok_or_else(|| anyhow!("[search-index] section is required"))?;
                Arc::new(SearchIndexSink::new(index)?)
            }
            OutputKind::Queue => {
                let subject = config
                    .nats
                    .as_ref()
                    .and_then(|n| n.output_subject.clone())
                    .ok_or_else(|| anyhow!("nats output-subject is required"))?;
                let publisher = nats
                    .clone()
                    .ok_or_else(|| anyhow!("Queue output selected without a connection"))?;
                Arc::new(QueueSink::new(publisher, subject))
            }
        };
        sinks.push(sink);
    }

    match sinks.len() {
        1 => Ok(sinks.remove(0)),
        _ => Ok(Arc::new(CompositeSink::new(sinks))),
    }
}

fn build_errors(
    config: &Config,
    nats: Option<Arc<NatsQueue>>,
) -> anyhow::Result<Arc<dyn ErrorSink>> {
    match config.sinks.errors {
        ErrorKind::Console => Ok(Arc::new(ConsoleSink)),
        ErrorKind::Queue => {
            let subject = config
                .nats
                .as_ref()
                .and_then(|n| n.error_subject.clone())
                .ok_or_else(|| anyhow!("nats error-subject is required"))?;
            let publisher =
                nats.ok_or_else(|| anyhow!("Queue error sink selected without a connection"))?;
            Ok(Arc::new(QueueSink::new(publisher, subject)))
        }
    }
}
