//! Per-packet processing: normalize, count, stream, batch, flush.
//!
//! One [`PacketPipeline`] instance owns the shared aggregation state.
//! Each packet is normalized once, streamed to the raw-event topic,
//! counted, and buffered. When the buffer reaches the configured batch
//! size it is swapped out under the lock and shipped from a separate
//! task, so collector latency never stalls packet processing.
//!
//! Failure policy at this layer: stream publish errors and upload
//! errors are logged, counted, and swallowed. A batch whose upload
//! fails is gone; the collector's history simply has a hole. Aggregate
//! snapshots go out only after a successful upload, so snapshot cadence
//! tracks collector ingest.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use netwatch_config::{PipelineConfig, TopicsConfig};
use netwatch_core::batch::BatchBuffer;
use netwatch_core::events::normalize::{EventNormalizer, PacketEvent};
use netwatch_core::events::packet::DecodedPacket;
use netwatch_core::stats::TrafficStats;
use netwatch_export::{
    BatchUploader, ExportError, PacketBatch, PortSnapshot, ProtocolSnapshot, StreamPublisher,
    TalkerSnapshot,
};
use netwatch_telemetry::logging::EventLogger;
use netwatch_telemetry::MetricsRecorder;

/// Counters and batch buffer move together under one lock; every
/// packet touches both and nothing else contends on them.
struct SharedState {
    stats: TrafficStats,
    batch: BatchBuffer,
}

pub struct PacketPipeline {
    normalizer: EventNormalizer,
    state: Mutex<SharedState>,
    publisher: Arc<dyn StreamPublisher>,
    uploader: Arc<BatchUploader>,
    topics: TopicsConfig,
    metrics: Arc<MetricsRecorder>,
    batch_size: usize,
    top_n: usize,
}

impl PacketPipeline {
    pub fn new(
        normalizer: EventNormalizer,
        publisher: Arc<dyn StreamPublisher>,
        uploader: Arc<BatchUploader>,
        topics: TopicsConfig,
        pipeline: &PipelineConfig,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            normalizer,
            state: Mutex::new(SharedState {
                stats: TrafficStats::new(),
                batch: BatchBuffer::new(),
            }),
            publisher,
            uploader,
            topics,
            metrics,
            batch_size: pipeline.batch_size,
            top_n: pipeline.top_n,
        }
    }

    /// Processes one decoded packet end to end.
    ///
    /// The event lands in the batch buffer exactly once and bumps each
    /// applicable counter exactly once. If this packet fills the batch,
    /// the swap happens here and the upload runs in its own task.
    pub async fn handle_packet(self: &Arc<Self>, packet: DecodedPacket) {
        let event = self.normalizer.normalize(&packet);

        self.publish_logged(&self.topics.raw_packets, &event).await;

        let flushed = {
            let mut state = self.state.lock();
            state.stats.observe(&packet);
            state.batch.push(event);
            if state.batch.len() >= self.batch_size {
                Some(state.batch.take_all())
            } else {
                None
            }
        };
        self.metrics.events_processed.inc();

        if let Some(events) = flushed {
            let pipeline = Arc::clone(self);
            tokio::spawn(async move {
                pipeline.flush(events).await;
            });
        }
    }

    /// Ships one swapped-out batch and, on success, the current
    /// aggregate snapshots.
    async fn flush(&self, events: Vec<PacketEvent>) {
        let meta = self.normalizer.meta();
        let batch = PacketBatch {
            agent_id: meta.agent_id.clone(),
            host_name: meta.host_name.clone(),
            interface_name: meta.interface.clone(),
            packets: events,
        };

        info!(packets = batch.packets.len(), "sending batch to collector");
        let started = Instant::now();

        match self.uploader.upload(&batch).await {
            Ok(()) => {
                self.metrics
                    .upload_latency
                    .observe(started.elapsed().as_secs_f64());
                self.metrics.batches_flushed.inc();
                self.publish_aggregates().await;
            }
            Err(err) => {
                self.metrics.batches_failed.inc();
                EventLogger::delivery_failure("collector", batch.packets.len(), err);
            }
        }
    }

    async fn publish_aggregates(&self) {
        let agent_id = self.normalizer.meta().agent_id.clone();

        let (talkers, ports, protocols) = {
            let state = self.state.lock();
            (
                state.stats.top_talkers(self.top_n),
                state.stats.top_ports(self.top_n),
                state.stats.protocol_counts(),
            )
        };

        let talkers = TalkerSnapshot::new(&agent_id, talkers);
        let ports = PortSnapshot::new(&agent_id, ports);
        let protocols = ProtocolSnapshot::new(&agent_id, protocols);

        self.publish_logged(&self.topics.top_talkers, &talkers).await;
        self.publish_logged(&self.topics.top_ports, &ports).await;
        self.publish_logged(&self.topics.protocol_stats, &protocols)
            .await;
        debug!("aggregate snapshots published");
    }

    /// Publishes one record, absorbing any failure into a counter and a
    /// log line. Nothing on the streaming path may error upward.
    async fn publish_logged<T: Serialize>(&self, topic: &str, record: &T) {
        if let Err(err) = self.publish_json(topic, record).await {
            self.metrics.publish_failures.inc();
            EventLogger::delivery_failure(topic, 1, err);
        }
    }

    async fn publish_json<T: Serialize>(&self, topic: &str, record: &T) -> Result<(), ExportError> {
        let bytes = serde_json::to_vec(record)?;
        self.publisher.publish(topic, &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingPublisher;
    use chrono::{TimeZone, Utc};
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use netwatch_config::{AuthConfig, BackendConfig};
    use netwatch_core::events::normalize::AgentMeta;
    use netwatch_core::events::packet::{NetworkMeta, TransportMeta};
    use netwatch_core::time::SystemClock;
    use netwatch_export::TokenCache;
    use serde_json::json;
    use std::time::Duration;

    fn tcp_packet(src: &str, src_port: u16, dst_port: u16) -> DecodedPacket {
        DecodedPacket {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            length: 60,
            network: Some(NetworkMeta {
                src_ip: src.parse().unwrap(),
                dst_ip: "192.168.0.1".parse().unwrap(),
                protocol: 6,
            }),
            transport: Some(TransportMeta::Tcp {
                src_port,
                dst_port,
                flags: "S".into(),
            }),
            payload: None,
        }
    }

    fn udp_packet(src: &str, dst_port: u16) -> DecodedPacket {
        DecodedPacket {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            length: 90,
            network: Some(NetworkMeta {
                src_ip: src.parse().unwrap(),
                dst_ip: "192.168.0.1".parse().unwrap(),
                protocol: 17,
            }),
            transport: Some(TransportMeta::Udp {
                src_port: 5353,
                dst_port,
                length: 70,
            }),
            payload: None,
        }
    }

    fn pipeline_for(
        server: &Server,
        publisher: Arc<RecordingPublisher>,
        batch_size: usize,
    ) -> Arc<PacketPipeline> {
        let auth = AuthConfig {
            token_url: server.url_str("/oauth2/token"),
            client_id: "netwatch-agent".into(),
            client_secret: "s3cret".into(),
        };
        let backend = BackendConfig {
            url: server.url_str("/api/v1/packets/batch"),
            timeout_ms: 5000,
        };
        let tokens = Arc::new(TokenCache::new(auth, Arc::new(SystemClock)).unwrap());
        let uploader = Arc::new(BatchUploader::new(&backend, tokens).unwrap());

        let normalizer = EventNormalizer::new(AgentMeta {
            agent_id: "agent-1".into(),
            host_name: "host-1".into(),
            interface: "eth0".into(),
        });

        Arc::new(PacketPipeline::new(
            normalizer,
            publisher,
            uploader,
            TopicsConfig::default(),
            &PipelineConfig {
                batch_size,
                top_n: 10,
            },
            Arc::new(MetricsRecorder::new()),
        ))
    }

    fn expect_token(server: &Server) {
        server.expect(
            Expectation::matching(all_of![
                request::method("POST"),
                request::path("/oauth2/token"),
            ])
            .respond_with(json_encoded(
                json!({"access_token": "tok-1", "expires_in": 300}),
            )),
        );
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn events_accumulate_below_the_threshold() {
        let server = Server::run();
        let publisher = Arc::new(RecordingPublisher::new());
        let pipeline = pipeline_for(&server, publisher.clone(), 200);

        pipeline.handle_packet(tcp_packet("10.0.0.1", 80, 51000)).await;
        pipeline.handle_packet(tcp_packet("10.0.0.2", 80, 51001)).await;
        pipeline.handle_packet(udp_packet("10.0.0.1", 53)).await;

        {
            let state = pipeline.state.lock();
            assert_eq!(state.batch.len(), 3);
            assert_eq!(
                state.stats.top_talkers(10),
                vec![
                    ("10.0.0.1".parse().unwrap(), 2),
                    ("10.0.0.2".parse().unwrap(), 1),
                ]
            );
            // Both TCP packets hit port 80; the mix covers both protocols.
            assert_eq!(state.stats.top_ports(1), vec![(80, 2)]);
            assert_eq!(state.stats.protocol_counts(), vec![(6, 2), (17, 1)]);
        }

        // Raw events streamed immediately, no batch, no snapshots.
        assert_eq!(publisher.on_topic("netwatch.raw-packets").len(), 3);
        assert_eq!(publisher.total(), 3);
        assert_eq!(pipeline.metrics.events_processed.get(), 3);
        assert_eq!(pipeline.metrics.batches_flushed.get(), 0);
    }

    #[tokio::test]
    async fn threshold_flush_uploads_and_publishes_snapshots() {
        let server = Server::run();
        expect_token(&server);
        server.expect(
            Expectation::matching(all_of![
                request::method("POST"),
                request::path("/api/v1/packets/batch"),
                request::headers(contains(("authorization", "Bearer tok-1"))),
            ])
            .times(1)
            .respond_with(status_code(200)),
        );

        let publisher = Arc::new(RecordingPublisher::new());
        let pipeline = pipeline_for(&server, publisher.clone(), 2);

        pipeline.handle_packet(tcp_packet("10.0.0.1", 80, 51000)).await;
        pipeline.handle_packet(tcp_packet("10.0.0.1", 80, 51001)).await;

        wait_until(|| pipeline.metrics.batches_flushed.get() == 1).await;

        // Buffer swapped out atomically at the threshold.
        assert_eq!(pipeline.state.lock().batch.len(), 0);

        let talkers = publisher.on_topic("netwatch.top-talkers");
        assert_eq!(
            talkers,
            vec![json!({"agentId": "agent-1", "topTalkers": [["10.0.0.1", 2]]})]
        );
        let ports = publisher.on_topic("netwatch.top-ports");
        assert_eq!(
            ports,
            vec![json!({
                "agentId": "agent-1",
                "topPorts": [[80, 2], [51000, 1], [51001, 1]]
            })]
        );
        let protocols = publisher.on_topic("netwatch.protocol-stats");
        assert_eq!(
            protocols,
            vec![json!({"agentId": "agent-1", "protocolStats": [["6", 2]]})]
        );
    }

    #[tokio::test]
    async fn publisher_failure_never_stops_processing() {
        let server = Server::run();
        let publisher = Arc::new(RecordingPublisher::new());
        publisher.fail_all();
        let pipeline = pipeline_for(&server, publisher.clone(), 200);

        for _ in 0..3 {
            pipeline.handle_packet(tcp_packet("10.0.0.1", 80, 51000)).await;
        }

        // Counting and buffering proceed despite the dead stream.
        assert_eq!(pipeline.state.lock().batch.len(), 3);
        assert_eq!(pipeline.metrics.publish_failures.get(), 3);
        assert_eq!(pipeline.metrics.events_processed.get(), 3);
    }

    #[tokio::test]
    async fn failed_upload_drops_the_batch_and_skips_snapshots() {
        let server = Server::run();
        expect_token(&server);
        server.expect(
            Expectation::matching(all_of![
                request::method("POST"),
                request::path("/api/v1/packets/batch"),
            ])
            .times(1)
            .respond_with(status_code(500)),
        );

        let publisher = Arc::new(RecordingPublisher::new());
        let pipeline = pipeline_for(&server, publisher.clone(), 1);

        pipeline.handle_packet(tcp_packet("10.0.0.1", 80, 51000)).await;

        wait_until(|| pipeline.metrics.batches_failed.get() == 1).await;

        // The batch is gone, the next one starts clean, and no
        // snapshots were published for the failed flush.
        assert_eq!(pipeline.state.lock().batch.len(), 0);
        assert_eq!(pipeline.metrics.batches_flushed.get(), 0);
        assert!(publisher.on_topic("netwatch.top-talkers").is_empty());
        assert_eq!(publisher.on_topic("netwatch.raw-packets").len(), 1);
    }

    #[tokio::test]
    async fn counters_survive_flushes() {
        let server = Server::run();
        expect_token(&server);
        server.expect(
            Expectation::matching(all_of![
                request::method("POST"),
                request::path("/api/v1/packets/batch"),
            ])
            .times(2)
            .respond_with(status_code(200)),
        );

        let publisher = Arc::new(RecordingPublisher::new());
        let pipeline = pipeline_for(&server, publisher.clone(), 1);

        pipeline.handle_packet(tcp_packet("10.0.0.1", 80, 51000)).await;
        wait_until(|| pipeline.metrics.batches_flushed.get() == 1).await;
        pipeline.handle_packet(tcp_packet("10.0.0.1", 80, 51001)).await;
        wait_until(|| pipeline.metrics.batches_flushed.get() == 2).await;

        let talkers = publisher.on_topic("netwatch.top-talkers");
        assert_eq!(talkers.len(), 2);
        // Cumulative since start, not per-batch.
        assert_eq!(talkers[1], json!({"agentId": "agent-1", "topTalkers": [["10.0.0.1", 2]]}));
    }
}
