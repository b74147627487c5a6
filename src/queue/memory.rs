//! In-process queue
//!
//! Backs tests and local runs. Pending messages are handed out in FIFO
//! order; acknowledgments and publishes are recorded for inspection.

use crate::queue::traits::{Delivery, InputQueue, Publisher, QueueError, QueueResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// FIFO queue held in memory
#[derive(Default)]
pub struct MemoryQueue {
    pending: Mutex<VecDeque<Delivery>>,
    acked: Mutex<Vec<u64>>,
    published: Mutex<Vec<(String, String)>>,
    next_id: AtomicU64,
    fail_receive: AtomicBool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a message and returns its delivery id
    pub fn push(&self, body: impl Into<String>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Delivery::new(id, body));
        id
    }

    /// Makes subsequent receives fail until reset
    pub fn set_fail_receive(&self, fail: bool) {
        self.fail_receive.store(fail, Ordering::SeqCst);
    }

    /// Number of messages not yet received
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Delivery ids acknowledged so far, in acknowledgment order
    pub fn acked(&self) -> Vec<u64> {
        self.acked.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// `(subject, payload)` pairs published so far
    pub fn published(&self) -> Vec<(String, String)> {
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl InputQueue for MemoryQueue {
    async fn receive(&self, max_messages: usize) -> QueueResult<Vec<Delivery>> {
        if self.fail_receive.load(Ordering::SeqCst) {
            return Err(QueueError::Receive("memory queue unavailable".to_string()));
        }
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let count = max_messages.min(pending.len());
        Ok(pending.drain(..count).collect())
    }

    async fn ack(&self, delivery: &Delivery) -> QueueResult<()> {
        self.acked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(delivery.id);
        Ok(())
    }
}

#[async_trait]
impl Publisher for MemoryQueue {
    async fn publish(&self, subject: &str, payload: String) -> QueueResult<()> {
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((subject.to_string(), payload));
        Ok(())
    }
}
