//! Message queues
//!
//! This module provides the queue side of the crawler:
//! - [`InputQueue`] - where crawl requests come from
//! - [`Publisher`] - raw payload publishing used by queue-backed sinks
//! - NATS JetStream, SQLite domain list and in-memory implementations

mod domains;
mod memory;
mod nats;
mod traits;

pub use domains::DomainListQueue;
pub use memory::MemoryQueue;
pub use nats::NatsQueue;
pub use traits::{Delivery, InputQueue, Publisher, QueueError, QueueResult};
