//! Strategy result to output record transformation
//!
//! Rendered pages arrive as the rendering API's JSON payload:
//!
//! ```json
//! {
//!   "requestedUrl": "https://example.com",
//!   "html": "<html>...</html>",
//!   "har": { "log": { "entries": [
//!     { "request": { "url": "..." }, "response": { "headers": [...] } }
//!   ] } }
//! }
//! ```
//!
//! Every other crawling type passes its text through untouched.

use crate::crawler::strategy::Response;
use crate::model::{CrawlTarget, CrawlingType, OutputRecord};
use serde_json::Value;
use thiserror::Error;

/// Errors raised when a render payload doesn't have the expected shape
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Render payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Render payload is missing '{0}'")]
    MissingField(&'static str),
}

/// Builds the output record for a successful crawl
pub fn to_output_record(
    target: &CrawlTarget,
    response: &Response,
) -> Result<OutputRecord, TransformError> {
    match target.crawling_type {
        CrawlingType::Render => render_record(target, &response.text),
        _ => Ok(OutputRecord::plain(
            target.domain.clone(),
            target.crawling_type,
            response.text.clone(),
        )),
    }
}

fn render_record(target: &CrawlTarget, payload: &str) -> Result<OutputRecord, TransformError> {
    let payload: Value = serde_json::from_str(payload)?;

    let page_url = payload
        .get("requestedUrl")
        .and_then(Value::as_str)
        .ok_or(TransformError::MissingField("requestedUrl"))?;
    let html = payload
        .get("html")
        .and_then(Value::as_str)
        .ok_or(TransformError::MissingField("html"))?;

    let mut record = OutputRecord::plain(target.domain.clone(), CrawlingType::Render, html);
    record.page_url = Some(page_url.to_string());

    // No HAR at all means capture was switched off; a HAR without entries is malformed.
    let Some(har) = payload.get("har") else {
        return Ok(record);
    };
    let entries = har
        .pointer("/log/entries")
        .and_then(Value::as_array)
        .ok_or(TransformError::MissingField("har.log.entries"))?;

    if let Some(first) = entries.first() {
        let headers = first
            .pointer("/response/headers")
            .ok_or(TransformError::MissingField("har.log.entries[0].response.headers"))?;

        let web_requests = entries
            .iter()
            .map(|entry| {
                entry
                    .pointer("/request/url")
                    .and_then(Value::as_str)
                    .ok_or(TransformError::MissingField("har.log.entries[].request.url"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        record.headers = Some(serde_json::to_string(headers)?);
        record.web_requests = Some(serde_json::to_string(&web_requests)?);
    }

    Ok(record)
}
