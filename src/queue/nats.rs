//! NATS JetStream transport
//!
//! Crawl requests are pulled from a durable consumer on a JetStream stream.
//! Pulled messages are parked until acknowledged so that [`Delivery`] stays
//! a plain value. The consumer's ack wait has to outlast a whole batch,
//! since parked messages sit unacknowledged while earlier ones are crawled.
//! An existing durable consumer keeps the ack wait it was created with.
//! Output and error payloads are published to JetStream subjects and wait
//! for the server's publish ack.

use crate::config::NatsConfig;
use crate::queue::traits::{Delivery, InputQueue, Publisher, QueueError, QueueResult};
use async_nats::jetstream::{self, consumer::PullConsumer};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// JetStream-backed input queue and publisher
pub struct NatsQueue {
    jetstream: jetstream::Context,
    consumer: PullConsumer,
    unacked: Mutex<HashMap<u64, jetstream::Message>>,
    next_id: AtomicU64,
}

impl NatsQueue {
    /// Connects and binds the durable pull consumer, creating the stream if needed
    pub async fn connect(config: &NatsConfig) -> QueueResult<Self> {
        let client = async_nats::connect(config.url.as_str())
            .await
            .map_err(|e| QueueError::Connect(e.to_string()))?;
        let jetstream = jetstream::new(client);

        let stream = jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: config.stream.clone(),
                subjects: vec![config.input_subject.clone()],
                ..Default::default()
            })
            .await
            .map_err(|e| QueueError::Connect(e.to_string()))?;

        let consumer: PullConsumer = stream
            .get_or_create_consumer(
                &config.consumer,
                jetstream::consumer::pull::Config {
                    durable_name: Some(config.consumer.clone()),
                    filter_subject: config.input_subject.clone(),
                    ack_wait: Duration::from_secs(config.ack_wait_secs),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| QueueError::Connect(e.to_string()))?;

        tracing::info!(
            stream = %config.stream,
            consumer = %config.consumer,
            "Connected to NATS at {}",
            config.url
        );

        Ok(Self {
            jetstream,
            consumer,
            unacked: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl InputQueue for NatsQueue {
    async fn receive(&self, max_messages: usize) -> QueueResult<Vec<Delivery>> {
        let batch = self
            .consumer
            .fetch()
            .max_messages(max_messages)
            .messages()
            .await
            .map_err(|e| QueueError::Receive(e.to_string()))?;

        drain_batch(batch, |message: jetstream::Message| {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let body = String::from_utf8_lossy(&message.payload).into_owned();
            self.unacked
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(id, message);
            Delivery::new(id, body)
        })
        .await
    }

    async fn ack(&self, delivery: &Delivery) -> QueueResult<()> {
        let message = self
            .unacked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&delivery.id)
            .ok_or_else(|| QueueError::Ack {
                id: delivery.id,
                message: "delivery is not pending".to_string(),
            })?;

        message.ack().await.map_err(|e| QueueError::Ack {
            id: delivery.id,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Publisher for NatsQueue {
    async fn publish(&self, subject: &str, payload: String) -> QueueResult<()> {
        self.jetstream
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| publish_error(subject, e))?
            .await
            .map_err(|e| publish_error(subject, e))?;
        Ok(())
    }
}

/// Collects a fetched batch, parking each message through `park`
///
/// A stream error after some messages arrived ends the batch early and
/// hands out what was parked, so nothing is left unacknowledged. An error
/// before any message is a receive failure.
async fn drain_batch<S, M, E>(
    batch: S,
    mut park: impl FnMut(M) -> Delivery,
) -> QueueResult<Vec<Delivery>>
where
    S: Stream<Item = Result<M, E>>,
    E: Display,
{
    futures::pin_mut!(batch);

    let mut deliveries = Vec::new();
    while let Some(item) = batch.next().await {
        match item {
            Ok(message) => deliveries.push(park(message)),
            Err(e) if deliveries.is_empty() => return Err(QueueError::Receive(e.to_string())),
            Err(e) => {
                tracing::warn!(
                    received = deliveries.len(),
                    "Batch cut short by stream error: {}",
                    e
                );
                break;
            }
        }
    }
    Ok(deliveries)
}

fn publish_error(subject: &str, error: impl Display) -> QueueError {
    QueueError::Publish {
        subject: subject.to_string(),
        message: error.to_string(),
    }
}
