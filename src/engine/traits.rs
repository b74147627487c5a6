//! Engine traits and shared types

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while constructing an engine
///
/// Fetches themselves never fail loudly: a failed attempt is logged and the
/// engine reports "no result".
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid header '{0}'")]
    InvalidHeader(String),
}

/// Transport-level response accepted by an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// The candidate URL that produced this response
    pub url: String,

    /// HTTP status code, always within [200, 400)
    pub status_code: u16,

    /// Response body (HTML, or the rendering API's JSON)
    pub body: String,
}

/// A single logical fetch with protocol/host fallback
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// Fetches `domain`, returning `None` once every fallback has failed
    async fn fetch(&self, domain: &str) -> Option<FetchResponse>;

    /// Engine name used in logs
    fn name(&self) -> &'static str;
}

/// Returns true if the status code is accepted as a successful attempt
pub fn is_accepted_status(status_code: u16) -> bool {
    (200..400).contains(&status_code)
}
