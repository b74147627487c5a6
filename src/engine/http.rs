//! Plain HTTP fetch engine
//!
//! Issues GET requests through the fixed fallback sequence with a shared
//! header set and timeout.

use crate::config::HttpConfig;
use crate::engine::fallback::first_success;
use crate::engine::traits::{is_accepted_status, EngineError, FetchEngine, FetchResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// Builds the default header map sent with every attempt
///
/// The user agent is always present; `extra` may add or override others.
pub fn build_headers(
    user_agent: &str,
    extra: &BTreeMap<String, String>,
) -> Result<HeaderMap, EngineError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent)
            .map_err(|_| EngineError::InvalidHeader(USER_AGENT.to_string()))?,
    );
    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| EngineError::InvalidHeader(name.clone()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| EngineError::InvalidHeader(name.to_string()))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Builds an HTTP client with the configured headers and timeout
pub fn build_http_client(config: &HttpConfig, timeout: Duration) -> Result<Client, EngineError> {
    let headers = build_headers(&config.user_agent, &config.headers)?;
    let client = Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()?;
    Ok(client)
}

/// Fetches page source over plain HTTP(S)
pub struct HttpEngine {
    client: Client,
}

impl HttpEngine {
    /// Creates an engine using the plain fetch timeout from `config`
    pub fn new(config: &HttpConfig) -> Result<Self, EngineError> {
        let timeout = Duration::from_secs(config.fetch_timeout_secs);
        Ok(Self {
            client: build_http_client(config, timeout)?,
        })
    }

    async fn attempt(&self, url: String) -> Option<FetchResponse> {
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                log_transport_error(&url, &e);
                return None;
            }
        };

        let status_code = response.status().as_u16();
        if !is_accepted_status(status_code) {
            tracing::warn!(url = %url, status_code, "Response outside accepted range");
            return None;
        }

        match response.text().await {
            Ok(body) => Some(FetchResponse {
                url,
                status_code,
                body,
            }),
            Err(e) => {
                log_transport_error(&url, &e);
                None
            }
        }
    }
}

#[async_trait]
impl FetchEngine for HttpEngine {
    async fn fetch(&self, domain: &str) -> Option<FetchResponse> {
        let result = first_success(domain, |url| self.attempt(url)).await;
        if result.is_none() {
            tracing::warn!(domain, engine = self.name(), "All fallback attempts failed");
        }
        result
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Logs a failed attempt with the failure class reqwest reports
pub(crate) fn log_transport_error(url: &str, error: &reqwest::Error) {
    if error.is_timeout() {
        tracing::warn!(url, "Timeout occurred: {}", error);
    } else if error.is_connect() {
        tracing::warn!(url, "Connection error occurred: {}", error);
    } else if error.is_request() {
        tracing::warn!(url, "Request error occurred: {}", error);
    } else if error.is_body() || error.is_decode() {
        tracing::warn!(url, "Failed to read response body: {}", error);
    } else {
        tracing::warn!(url, "Exception for url: {}", error);
    }
}
