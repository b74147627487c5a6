//! Fetch engines
//!
//! Engines perform one raw network operation:
//! - [`HttpEngine`] - GET with scheme/host fallback
//! - [`RenderEngine`] - the same fallback through a headless rendering API
//! - [`DnsRecordsEngine`] - a single typed DNS lookup

mod dns;
pub mod fallback;
mod http;
mod render;
mod traits;

pub use dns::{lookup_host, DnsRecordsEngine, DnsResolver, HickoryResolver, LookupError};
pub use fallback::{fallback_urls, first_success};
pub use http::{build_headers, build_http_client, HttpEngine};
pub use render::RenderEngine;
pub use traits::{is_accepted_status, EngineError, FetchEngine, FetchResponse};
