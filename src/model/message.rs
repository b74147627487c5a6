//! Inbound message decoding
//!
//! Turns a raw queue payload into a typed [`CrawlTarget`].

use crate::model::{CrawlingType, UnknownCrawlingType};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while decoding an inbound message
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Empty message body")]
    Empty,

    #[error("Message is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Message is not a JSON object")]
    NotAnObject,

    #[error("Domain key is not found")]
    MissingDomain,

    #[error("Empty input crawling type")]
    MissingCrawlingType,

    #[error("Can't map crawling type: {0}")]
    UnknownCrawlingType(#[from] UnknownCrawlingType),

    #[error("url_to_crawl is required for careers messages")]
    MissingUrlToCrawl,
}

/// A decoded crawl request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// The domain the result is recorded under
    pub domain: String,

    /// Selects the strategy that handles this target
    pub crawling_type: CrawlingType,

    /// What the strategy actually fetches; equals `domain` except for careers
    pub url_to_crawl: String,
}

impl CrawlTarget {
    /// Creates a target that crawls the domain itself
    pub fn new(domain: impl Into<String>, crawling_type: CrawlingType) -> Self {
        let domain = domain.into();
        Self {
            url_to_crawl: domain.clone(),
            domain,
            crawling_type,
        }
    }

    /// Creates a careers target with a caller-supplied page URL
    pub fn careers(domain: impl Into<String>, url_to_crawl: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            crawling_type: CrawlingType::Careers,
            url_to_crawl: url_to_crawl.into(),
        }
    }
}

/// Decodes a raw message body into a crawl target
///
/// # Errors
///
/// * [`MessageError::Empty`] - blank body or an empty JSON object
/// * [`MessageError::MissingDomain`] - no string `domain` key
/// * [`MessageError::MissingCrawlingType`] - no `crawling_type` token
/// * [`MessageError::UnknownCrawlingType`] - token not in the closed set
/// * [`MessageError::MissingUrlToCrawl`] - careers message without `url_to_crawl`
pub fn decode_message(body: &str) -> Result<CrawlTarget, MessageError> {
    if body.trim().is_empty() {
        return Err(MessageError::Empty);
    }

    let value: Value = serde_json::from_str(body)?;
    let object = value.as_object().ok_or(MessageError::NotAnObject)?;
    if object.is_empty() {
        return Err(MessageError::Empty);
    }

    let domain = string_field(object, "domain").ok_or(MessageError::MissingDomain)?;

    let token = string_field(object, "crawling_type")
        .filter(|token| !token.is_empty())
        .ok_or(MessageError::MissingCrawlingType)?;
    let crawling_type: CrawlingType = token.parse()?;

    if crawling_type == CrawlingType::Careers {
        let url = string_field(object, "url_to_crawl").ok_or(MessageError::MissingUrlToCrawl)?;
        return Ok(CrawlTarget::careers(domain, url));
    }

    Ok(CrawlTarget::new(domain, crawling_type))
}

fn string_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}
