//! Streaming publication to the message bus.
//!
//! Every normalized event, every aggregate snapshot, and every heartbeat
//! leaves through a [`StreamPublisher`]. The Kafka implementation hands
//! records to the client's internal queue and returns immediately; the
//! transport performs its own bounded retries, and deliveries that still
//! fail are logged by a background watcher rather than surfaced.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use tracing::warn;

use netwatch_config::BusConfig;

use crate::error::ExportError;

/// Outbound hand-off to the streaming bus.
///
/// `publish` reports only the hand-off result. Once the transport has
/// accepted a record its fate is out of the caller's hands.
#[async_trait]
pub trait StreamPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), ExportError>;

    /// Drains in-flight records, bounded by `timeout`. Called at shutdown.
    fn flush(&self, _timeout: Duration) {}
}

/// Kafka-backed publisher.
pub struct KafkaPublisher {
    producer: FutureProducer,
}

impl KafkaPublisher {
    pub fn new(bus: &BusConfig) -> Result<Self, ExportError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", bus.brokers.as_str())
            .set("message.send.max.retries", bus.send_retries.to_string())
            .create()
            .map_err(|e| ExportError::Publish(e.to_string()))?;

        Ok(Self { producer })
    }
}

#[async_trait]
impl StreamPublisher for KafkaPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), ExportError> {
        let record: FutureRecord<'_, str, [u8]> = FutureRecord::to(topic).payload(payload);

        match self.producer.send_result(record) {
            Ok(delivery) => {
                let topic = topic.to_string();
                tokio::spawn(async move {
                    match delivery.await {
                        Ok(Ok(_)) => {}
                        Ok(Err((err, _))) => {
                            warn!(%topic, error = %err, "stream delivery failed")
                        }
                        Err(_) => warn!(%topic, "stream delivery abandoned"),
                    }
                });
                Ok(())
            }
            Err((err, _)) => Err(ExportError::Publish(err.to_string())),
        }
    }

    fn flush(&self, timeout: Duration) {
        if let Err(err) = self.producer.flush(timeout) {
            warn!(error = %err, "producer flush incomplete");
        }
    }
}
