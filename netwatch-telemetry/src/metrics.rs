//! ## netwatch-telemetry::metrics
//! **Prometheus registry for the pipeline**
//!
//! Counts what the pipeline does with every frame: captured, processed,
//! dropped at the queue, published, batched, uploaded. The `batches_failed`
//! counter is the only record of batches lost to upload errors, since
//! the upload path deliberately performs no retries.

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub packets_captured: IntCounter,
    pub events_processed: IntCounter,
    pub queue_dropped: IntCounter,
    pub publish_failures: IntCounter,
    pub batches_flushed: IntCounter,
    pub batches_failed: IntCounter,
    pub heartbeats_sent: IntCounter,
    pub upload_latency: Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();

        let packets_captured = IntCounter::new(
            "netwatch_packets_captured_total",
            "Frames handed over by the capture loop",
        )
        .unwrap();
        let events_processed = IntCounter::new(
            "netwatch_events_processed_total",
            "Events normalized and counted by the pipeline",
        )
        .unwrap();
        let queue_dropped = IntCounter::new(
            "netwatch_queue_dropped_total",
            "Frames dropped because the hand-off queue was full",
        )
        .unwrap();
        let publish_failures = IntCounter::new(
            "netwatch_publish_failures_total",
            "Stream publishes that failed after transport retries",
        )
        .unwrap();
        let batches_flushed = IntCounter::new(
            "netwatch_batches_flushed_total",
            "Batches uploaded successfully",
        )
        .unwrap();
        let batches_failed = IntCounter::new(
            "netwatch_batches_failed_total",
            "Batches dropped after a failed upload",
        )
        .unwrap();
        let heartbeats_sent = IntCounter::new(
            "netwatch_heartbeats_sent_total",
            "Heartbeat records published",
        )
        .unwrap();
        let upload_latency = Histogram::with_opts(
            HistogramOpts::new(
                "netwatch_upload_duration_seconds",
                "Batch upload round-trip time",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )
        .unwrap();

        for collector in [
            &packets_captured,
            &events_processed,
            &queue_dropped,
            &publish_failures,
            &batches_flushed,
            &batches_failed,
            &heartbeats_sent,
        ] {
            registry.register(Box::new(collector.clone())).unwrap();
        }
        registry.register(Box::new(upload_latency.clone())).unwrap();

        Self {
            registry,
            packets_captured,
            events_processed,
            queue_dropped,
            publish_failures,
            batches_flushed,
            batches_failed,
            heartbeats_sent,
            upload_latency,
        }
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }
}
