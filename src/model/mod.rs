//! Data model for crawl requests and results
//!
//! This module holds the closed set of crawling types, the decoded crawl
//! target built from an inbound message, and the output record handed to
//! sinks.

mod crawling_type;
mod message;
mod record;

pub use crawling_type::{CrawlingType, DnsRecordType, UnknownCrawlingType};
pub use message::{decode_message, CrawlTarget, MessageError};
pub use record::OutputRecord;
