//! Domain crawler: queue-driven page, render and DNS record collection
//!
//! This crate consumes crawl requests from a work queue, dispatches each to
//! the strategy bound to its crawling type, and publishes the normalized
//! result to an output sink. Failed requests are forwarded verbatim to an
//! error sink.

pub mod config;
pub mod crawler;
pub mod engine;
pub mod model;
pub mod output;
pub mod queue;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] engine::EngineError),

    #[error("Strategy registry error: {0}")]
    Locator(#[from] crawler::LocatorError),

    #[error("Queue error: {0}")]
    Queue(#[from] queue::QueueError),

    #[error("Sink error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlingService, RunMode, StrategyLocator};
pub use model::{CrawlTarget, CrawlingType, OutputRecord};
