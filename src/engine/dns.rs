//! DNS record engine
//!
//! Performs a single typed lookup and renders the answer as a newline
//! separated text blob. Resolution failures are logged and reported as "no
//! result"; they never reach the caller as errors.

use crate::config::DnsConfig;
use crate::model::DnsRecordType;
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::TokioAsyncResolver;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// IANA type code of the (deprecated) SPF record
const SPF_RECORD_CODE: u16 = 99;

/// Why a lookup produced no records
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("No answer for {0}")]
    NoAnswer(String),

    #[error("DNS search timeout for {0}")]
    Timeout(String),

    #[error("DNS lookup failed: {0}")]
    Other(String),
}

/// The resolver seam used by [`DnsRecordsEngine`]
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Queries `host` for records of `record_type`, returning each record as text
    async fn query(&self, host: &str, record_type: DnsRecordType)
        -> Result<Vec<String>, LookupError>;
}

/// Resolver backed by hickory
pub struct HickoryResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryResolver {
    /// Creates a resolver from the system configuration
    ///
    /// Falls back to hickory's default upstreams if the system configuration
    /// can't be read.
    pub fn new(config: &DnsConfig) -> Self {
        let (resolver_config, mut opts) = match hickory_resolver::system_conf::read_system_conf()
        {
            Ok(conf) => conf,
            Err(e) => {
                tracing::warn!("Can't read system resolver config, using defaults: {}", e);
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };
        opts.timeout = Duration::from_secs(config.timeout_secs);
        opts.attempts = config.attempts;

        Self {
            resolver: TokioAsyncResolver::tokio(resolver_config, opts),
        }
    }

    fn record_type(record_type: DnsRecordType) -> RecordType {
        match record_type {
            DnsRecordType::Spf => RecordType::from(SPF_RECORD_CODE),
            DnsRecordType::Cname => RecordType::CNAME,
            DnsRecordType::Mx => RecordType::MX,
            DnsRecordType::Ns => RecordType::NS,
            DnsRecordType::Soa => RecordType::SOA,
            DnsRecordType::Txt => RecordType::TXT,
        }
    }
}

#[async_trait]
impl DnsResolver for HickoryResolver {
    async fn query(
        &self,
        host: &str,
        record_type: DnsRecordType,
    ) -> Result<Vec<String>, LookupError> {
        let lookup = self
            .resolver
            .lookup(host, Self::record_type(record_type))
            .await
            .map_err(|e| match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => LookupError::NoAnswer(host.to_string()),
                ResolveErrorKind::Timeout => LookupError::Timeout(host.to_string()),
                _ => LookupError::Other(e.to_string()),
            })?;

        Ok(lookup.iter().map(render_rdata).collect())
    }
}

/// Renders one answer record as text
///
/// hickory has no SPF record type, so type-99 answers arrive as opaque data.
/// Their wire format is the same as TXT: a run of length-prefixed strings.
fn render_rdata(rdata: &RData) -> String {
    match rdata {
        RData::Unknown { code, rdata } if u16::from(*code) == SPF_RECORD_CODE => {
            character_strings(rdata.anything())
        }
        other => other.to_string(),
    }
}

/// Concatenates length-prefixed character strings, decoding them lossily
fn character_strings(mut data: &[u8]) -> String {
    let mut text = String::new();
    while let Some((&len, rest)) = data.split_first() {
        let len = usize::from(len).min(rest.len());
        text.push_str(&String::from_utf8_lossy(&rest[..len]));
        data = &rest[len..];
    }
    text
}

/// Extracts the hostname to query from a URL or bare domain
///
/// Any scheme is discarded and a leading `www.` is stripped. Input that
/// isn't a valid URL still loses its scheme and path.
pub fn lookup_host(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| raw_host(url).to_string());

    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

fn raw_host(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split(['/', '?', '#']).next().unwrap_or(rest)
}

/// Strips the quoting resolvers put around TXT-like records
fn clean_record(record: &str) -> &str {
    record.trim_matches('\'').trim_matches('"').trim()
}

/// Typed DNS lookups rendered as text
#[derive(Clone)]
pub struct DnsRecordsEngine {
    resolver: Arc<dyn DnsResolver>,
}

impl DnsRecordsEngine {
    pub fn new(resolver: Arc<dyn DnsResolver>) -> Self {
        Self { resolver }
    }

    /// Looks up `record_type` records for the host in `url`
    ///
    /// Returns the records joined with `\n`, or `None` on any resolution
    /// failure.
    pub async fn lookup(&self, url: &str, record_type: DnsRecordType) -> Option<String> {
        let host = lookup_host(url);
        match self.resolver.query(&host, record_type).await {
            Ok(records) => Some(
                records
                    .iter()
                    .map(|record| clean_record(record))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Err(e) => {
                tracing::error!(domain = %host, record_type = %record_type, "{}", e);
                None
            }
        }
    }
}
