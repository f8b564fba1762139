//! Liveness beacon, independent of the packet path.
//!
//! Publishes an online record at a fixed interval for the life of the
//! process. A dead broker makes noise in the logs but never stops the
//! loop; liveness reporting resumes by itself once the bus is back.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use netwatch_export::{HeartbeatRecord, StreamPublisher};
use netwatch_telemetry::MetricsRecorder;

pub struct HeartbeatEmitter {
    agent_id: String,
    host_name: String,
    address: String,
    topic: String,
    publisher: Arc<dyn StreamPublisher>,
    metrics: Arc<MetricsRecorder>,
}

impl HeartbeatEmitter {
    pub fn new(
        agent_id: String,
        host_name: String,
        address: String,
        topic: String,
        publisher: Arc<dyn StreamPublisher>,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            agent_id,
            host_name,
            address,
            topic,
            publisher,
            metrics,
        }
    }

    /// Builds and publishes one beacon.
    pub async fn beat(&self) {
        let record = HeartbeatRecord::online(
            &self.agent_id,
            &self.host_name,
            &self.address,
            Utc::now(),
        );

        let bytes = match serde_json::to_vec(&record) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "heartbeat serialization failed");
                return;
            }
        };

        match self.publisher.publish(&self.topic, &bytes).await {
            Ok(()) => {
                self.metrics.heartbeats_sent.inc();
                debug!(agent_id = %self.agent_id, "heartbeat published");
            }
            Err(err) => warn!(error = %err, "heartbeat publish failed"),
        }
    }

    /// Beats immediately, then at every interval tick, until the owning
    /// task is aborted.
    pub async fn run(self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            self.beat().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingPublisher;

    fn emitter(publisher: Arc<RecordingPublisher>) -> HeartbeatEmitter {
        HeartbeatEmitter::new(
            "agent-1".into(),
            "host-1".into(),
            "192.168.1.20".into(),
            "netwatch.agent-heartbeat".into(),
            publisher,
            Arc::new(MetricsRecorder::new()),
        )
    }

    #[tokio::test]
    async fn beat_publishes_an_online_record() {
        let publisher = Arc::new(RecordingPublisher::new());
        let emitter = emitter(publisher.clone());

        emitter.beat().await;

        let beats = publisher.on_topic("netwatch.agent-heartbeat");
        assert_eq!(beats.len(), 1);
        assert_eq!(beats[0]["agentId"], "agent-1");
        assert_eq!(beats[0]["hostName"], "host-1");
        assert_eq!(beats[0]["ip"], "192.168.1.20");
        assert_eq!(beats[0]["status"], "online");
        assert!(beats[0]["timestamp"].is_string());
        assert_eq!(emitter.metrics.heartbeats_sent.get(), 1);
    }

    #[tokio::test]
    async fn publish_failure_does_not_panic_or_count() {
        let publisher = Arc::new(RecordingPublisher::new());
        publisher.fail_all();
        let emitter = emitter(publisher);

        emitter.beat().await;
        emitter.beat().await;

        assert_eq!(emitter.metrics.heartbeats_sent.get(), 0);
    }
}
