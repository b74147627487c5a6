//! Crawling type definitions
//!
//! A crawling type is the closed tag that selects which strategy handles a
//! target. The DNS variants double as record-type tokens for lookups.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Selects the strategy (and engine) used for a crawl request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlingType {
    /// Raw page source over plain HTTP
    Source,
    /// Page rendered by the headless rendering API
    Render,
    /// A careers page whose URL is supplied by the caller
    Careers,
    /// SPF DNS records
    Spf,
    /// CNAME DNS records
    Cname,
    /// MX DNS records
    Mx,
    /// NS DNS records
    Ns,
    /// SOA DNS records
    Soa,
    /// TXT DNS records
    Txt,
}

/// DNS record kinds the record engine can look up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnsRecordType {
    Spf,
    Cname,
    Mx,
    Ns,
    Soa,
    Txt,
}

/// Returned when a token does not name any crawling type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown crawling type '{0}'")]
pub struct UnknownCrawlingType(pub String);

impl CrawlingType {
    /// Returns the wire token for this crawling type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Render => "render",
            Self::Careers => "careers",
            Self::Spf => "spf",
            Self::Cname => "cname",
            Self::Mx => "mx",
            Self::Ns => "ns",
            Self::Soa => "soa",
            Self::Txt => "txt",
        }
    }

    /// Parses a wire token (case-sensitive, exact match)
    ///
    /// Returns None if the token doesn't match any known crawling type.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "source" => Some(Self::Source),
            "render" => Some(Self::Render),
            "careers" => Some(Self::Careers),
            "spf" => Some(Self::Spf),
            "cname" => Some(Self::Cname),
            "mx" => Some(Self::Mx),
            "ns" => Some(Self::Ns),
            "soa" => Some(Self::Soa),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Returns all crawling types
    pub fn all() -> [Self; 9] {
        [
            Self::Source,
            Self::Render,
            Self::Careers,
            Self::Spf,
            Self::Cname,
            Self::Mx,
            Self::Ns,
            Self::Soa,
            Self::Txt,
        ]
    }

    /// Returns the DNS record kind for DNS-backed crawling types
    pub fn dns_record_type(&self) -> Option<DnsRecordType> {
        match self {
            Self::Spf => Some(DnsRecordType::Spf),
            Self::Cname => Some(DnsRecordType::Cname),
            Self::Mx => Some(DnsRecordType::Mx),
            Self::Ns => Some(DnsRecordType::Ns),
            Self::Soa => Some(DnsRecordType::Soa),
            Self::Txt => Some(DnsRecordType::Txt),
            Self::Source | Self::Render | Self::Careers => None,
        }
    }

    /// Returns true if this type is served by the DNS record engine
    pub fn is_dns(&self) -> bool {
        self.dns_record_type().is_some()
    }

    /// Returns the search-index document field this type is stored under
    pub fn index_field(&self) -> &'static str {
        match self {
            Self::Source | Self::Render => "body",
            Self::Careers => "careers_page",
            Self::Spf => "spf",
            Self::Cname => "cname",
            Self::Mx => "mx",
            Self::Ns => "ns",
            Self::Soa => "soa",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for CrawlingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CrawlingType {
    type Err = UnknownCrawlingType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| UnknownCrawlingType(s.to_string()))
    }
}

impl DnsRecordType {
    /// Returns the record type mnemonic used by resolvers
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spf => "SPF",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Ns => "NS",
            Self::Soa => "SOA",
            Self::Txt => "TXT",
        }
    }
}

impl fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
