use crate::model::CrawlingType;
use serde::{Deserialize, Serialize};

/// Normalized result of a successfully processed message
///
/// `page_url`, `headers` and `web_requests` are only populated for rendered
/// pages and are omitted from the JSON form otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub domain: String,
    pub crawling_type: CrawlingType,
    /// Raw text, HTML or DNS record blob
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    /// JSON-encoded response headers of the first HAR entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,
    /// JSON-encoded array of every request URL in the HAR log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_requests: Option<String>,
}

impl OutputRecord {
    /// Creates a pass-through record with no render metadata
    pub fn plain(
        domain: impl Into<String>,
        crawling_type: CrawlingType,
        response: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            crawling_type,
            response: response.into(),
            page_url: None,
            headers: None,
            web_requests: None,
        }
    }
}
