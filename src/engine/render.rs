//! Headless-render fetch engine
//!
//! Instead of fetching the target directly, every fallback candidate is
//! POSTed to the rendering API together with the rendering options. The
//! API's JSON reply (HTML plus HAR capture) is returned untouched.

use crate::config::{HttpConfig, RenderConfig};
use crate::engine::fallback::first_success;
use crate::engine::http::log_transport_error;
use crate::engine::traits::{is_accepted_status, EngineError, FetchEngine, FetchResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Request body understood by the rendering API
#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    url: &'a str,
    headers: &'a BTreeMap<String, String>,
    html: u8,
    timeout: u64,
    images: u8,
    wait: f64,
    har: u8,
    history: u8,
}

/// Fetches rendered pages through the rendering API
pub struct RenderEngine {
    client: Client,
    api_url: String,
    headers: BTreeMap<String, String>,
    timeout_secs: u64,
    options: RenderConfig,
}

impl RenderEngine {
    /// Creates a render engine
    ///
    /// The headers forwarded to the rendering API are the configured extra
    /// headers plus the user agent.
    pub fn new(
        api_url: impl Into<String>,
        http: &HttpConfig,
        options: RenderConfig,
    ) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.render_timeout_secs))
            .build()?;

        let mut headers = http.headers.clone();
        headers.insert("User-Agent".to_string(), http.user_agent.clone());

        Ok(Self {
            client,
            api_url: api_url.into(),
            headers,
            timeout_secs: http.render_timeout_secs,
            options,
        })
    }

    fn request_body<'a>(&'a self, url: &'a str) -> RenderRequest<'a> {
        RenderRequest {
            url,
            headers: &self.headers,
            html: 1,
            timeout: self.timeout_secs,
            images: u8::from(self.options.images),
            wait: self.options.wait,
            har: u8::from(self.options.har),
            history: u8::from(self.options.history),
        }
    }

    async fn attempt(&self, url: String) -> Option<FetchResponse> {
        let response = match self
            .client
            .post(&self.api_url)
            .json(&self.request_body(&url))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log_transport_error(&url, &e);
                return None;
            }
        };

        let status = response.status();
        if !is_accepted_status(status.as_u16()) || status == StatusCode::NO_CONTENT {
            tracing::warn!(url = %url, status_code = status.as_u16(), "Render API rejected page");
            return None;
        }

        match response.text().await {
            Ok(body) => Some(FetchResponse {
                url,
                status_code: status.as_u16(),
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
impl FetchEngine for RenderEngine {
    async fn fetch(&self, domain: &str) -> Option<FetchResponse> {
        let result = first_success(domain, |url| self.attempt(url)).await;
        if result.is_none() {
            tracing::warn!(domain, engine = self.name(), "All render attempts failed");
        }
        result
    }

    fn name(&self) -> &'static str {
        "render"
    }
}
