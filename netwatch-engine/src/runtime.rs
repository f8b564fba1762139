//! Agent runtime - wires capture, processing, export, and liveness together.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{spawn_blocking, JoinHandle};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, trace, warn};

use netwatch_capture::run_capture_loop;
use netwatch_config::NetwatchConfig;
use netwatch_core::events::normalize::{AgentMeta, EventNormalizer};
use netwatch_core::events::queue::PacketQueue;
use netwatch_core::time::SystemClock;
use netwatch_export::{BatchUploader, KafkaPublisher, StreamPublisher, TokenCache};
use netwatch_telemetry::MetricsRecorder;

use crate::error::AgentError;
use crate::heartbeat::HeartbeatEmitter;
use crate::host;
use crate::pipeline::PacketPipeline;

/// Owns every long-lived piece of the agent: the capture hand-off
/// queue, the processing pipeline, the stream producer, and the
/// liveness emitter.
pub struct AgentRuntime {
    config: Arc<NetwatchConfig>,
    meta: AgentMeta,
    address: String,
    /// Capture-to-processor hand-off queue (drop-on-full).
    pub queue: PacketQueue,
    /// Metrics collection subsystem.
    pub metrics: Arc<MetricsRecorder>,
    publisher: Arc<dyn StreamPublisher>,
    pipeline: Arc<PacketPipeline>,
}

impl AgentRuntime {
    /// Builds the runtime from loaded configuration.
    pub fn new(config: NetwatchConfig) -> Result<Self, AgentError> {
        info!("Initializing agent runtime");
        debug!("Agent config: {:?}", config.agent);

        let meta = AgentMeta {
            agent_id: config.agent.id.clone(),
            host_name: host::resolve_hostname(),
            interface: config.agent.interface.clone(),
        };
        let address = host::resolve_address(config.agent.address);

        let queue = PacketQueue::with_capacity(config.capture.queue_capacity);

        let metrics = Arc::new(MetricsRecorder::new());

        let publisher: Arc<dyn StreamPublisher> = Arc::new(KafkaPublisher::new(&config.bus)?);
        let tokens = Arc::new(TokenCache::new(config.auth.clone(), Arc::new(SystemClock))?);
        let uploader = Arc::new(BatchUploader::new(&config.backend, tokens)?);

        let pipeline = Arc::new(PacketPipeline::new(
            EventNormalizer::new(meta.clone()),
            publisher.clone(),
            uploader,
            config.bus.topics.clone(),
            &config.pipeline,
            metrics.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            meta,
            address,
            queue,
            metrics,
            publisher,
            pipeline,
        })
    }

    /// Captures live packets until the capture loop ends, either from a
    /// device error or a shutdown signal; then drains the queue and
    /// flushes the stream producer.
    #[instrument(skip_all, fields(interface = %self.meta.interface))]
    pub async fn run(self: Arc<Self>) -> Result<(), AgentError> {
        info!("Starting agent");
        debug!("Using capture config: {:?}", self.config.capture);

        let terminate = Arc::new(AtomicBool::new(false));
        let capture_done = Arc::new(AtomicBool::new(false));

        let shutdown_watcher = tokio::spawn({
            let terminate = terminate.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Shutdown signal received");
                    terminate.store(true, Ordering::Relaxed);
                }
            }
        });

        let processor = self.spawn_event_processor(capture_done.clone());
        let heartbeat = self.spawn_heartbeat();

        let capture_task = spawn_blocking({
            let interface = self.meta.interface.clone();
            let queue = self.queue.share();
            let metrics = self.metrics.clone();
            let capture = self.config.capture.clone();
            let terminate = terminate.clone();

            move || {
                info!("Starting packet capture on {interface}");
                run_capture_loop(
                    &interface,
                    capture.snaplen,
                    capture.promiscuous,
                    &terminate,
                    |packet| {
                        trace!("Captured frame: {} bytes", packet.length);
                        metrics.packets_captured.inc();
                        if !queue.push(packet) {
                            metrics.queue_dropped.inc();
                            warn!("Hand-off queue full, frame dropped");
                        }
                    },
                )
            }
        });

        let capture_result = capture_task.await?;

        // Capture is over; let the processor finish whatever is queued.
        capture_done.store(true, Ordering::Relaxed);
        processor.await?;
        heartbeat.abort();
        shutdown_watcher.abort();

        info!("Flushing stream producer");
        self.publisher.flush(Duration::from_secs(5));

        if let Err(e) = capture_result {
            error!("Capture failed: {e}");
            return Err(AgentError::Capture(e));
        }

        info!("Agent shutdown complete");
        Ok(())
    }

    /// Spawns the task that drains the hand-off queue into the
    /// pipeline. Runs until capture is done and the queue is empty.
    fn spawn_event_processor(&self, capture_done: Arc<AtomicBool>) -> JoinHandle<()> {
        let queue = self.queue.share();
        let pipeline = self.pipeline.clone();

        tokio::spawn(async move {
            info!("Event processor started");
            loop {
                match queue.pop() {
                    Some(packet) => pipeline.handle_packet(packet).await,
                    None => {
                        if capture_done.load(Ordering::Relaxed) {
                            break;
                        }
                        // Queue empty, avoid busy-spin
                        sleep(Duration::from_millis(10)).await;
                    }
                }
            }
            debug!("Event processor stopped");
        })
    }

    fn spawn_heartbeat(&self) -> JoinHandle<()> {
        let emitter = HeartbeatEmitter::new(
            self.meta.agent_id.clone(),
            self.meta.host_name.clone(),
            self.address.clone(),
            self.config.bus.topics.heartbeat.clone(),
            self.publisher.clone(),
            self.metrics.clone(),
        );
        let interval = Duration::from_secs(self.config.heartbeat.interval_secs);
        tokio::spawn(emitter.run(interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_builds_from_default_config() {
        let runtime = AgentRuntime::new(NetwatchConfig::default()).unwrap();
        assert!(runtime.queue.is_empty());
        assert_eq!(runtime.metrics.packets_captured.get(), 0);
        assert_eq!(runtime.meta.host_name, host::resolve_hostname());
    }
}
