//! Search-index sink
//!
//! Upserts one document per domain through the index's HTTP update API.
//! The document id is a SHA-256 of the domain (trailing `/` stripped), so
//! every crawling type for a domain merges into the same document under its
//! own field.

use crate::config::SearchIndexConfig;
use crate::model::OutputRecord;
use crate::output::traits::{OutputSink, SinkError, SinkResult};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Returns the document id for a domain
pub fn document_id(domain: &str) -> String {
    let normalized = domain.trim_end_matches('/');
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

/// Builds the upsert body for a record
pub fn upsert_body(record: &OutputRecord, timestamp: &str) -> Value {
    let mut doc = Map::new();
    doc.insert(
        record.crawling_type.index_field().to_string(),
        json!(record.response),
    );
    doc.insert("domain".to_string(), json!(record.domain));
    doc.insert("timestamp".to_string(), json!(timestamp));

    for (field, value) in [
        ("page_url", &record.page_url),
        ("headers", &record.headers),
        ("web_requests", &record.web_requests),
    ] {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            doc.insert(field.to_string(), json!(value));
        }
    }

    json!({ "doc": doc, "doc_as_upsert": true })
}

/// Upserts records into a search index
pub struct SearchIndexSink {
    client: Client,
    base_url: String,
    index: String,
    credentials: Option<(String, Option<String>)>,
}

impl SearchIndexSink {
    pub fn new(config: &SearchIndexConfig) -> SinkResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            index: config.index.clone(),
            credentials: config
                .username
                .clone()
                .map(|username| (username, config.password.clone())),
        })
    }

    fn update_url(&self, id: &str) -> String {
        format!("{}/{}/_update/{}", self.base_url, self.index, id)
    }
}

#[async_trait]
impl OutputSink for SearchIndexSink {
    async fn put(&self, record: &OutputRecord) -> SinkResult<()> {
        let id = document_id(&record.domain);
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut request = self
            .client
            .post(self.update_url(&id))
            .json(&upsert_body(record, &timestamp));
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, password.as_ref());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                id,
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            domain = %record.domain,
            crawling_type = %record.crawling_type,
            id = %id,
            "Document indexed"
        );
        Ok(())
    }
}
