//! Output sinks
//!
//! This module handles where processed messages go:
//! - [`OutputSink`] receives normalized records for successful messages
//! - [`ErrorSink`] receives the original body of every failed message
//! - Console, queue, search-index, in-memory and fan-out implementations

mod composite;
mod console;
mod memory;
mod queue;
mod search_index;
mod traits;

pub use composite::CompositeSink;
pub use console::ConsoleSink;
pub use memory::MemorySink;
pub use queue::QueueSink;
pub use search_index::{document_id, upsert_body, SearchIndexSink};
pub use traits::{ErrorSink, OutputSink, SinkError, SinkResult};
