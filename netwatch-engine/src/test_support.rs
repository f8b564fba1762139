//! Shared test doubles for engine tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use netwatch_export::{ExportError, StreamPublisher};

/// Publisher that records every payload and can be told to fail.
pub struct RecordingPublisher {
    sent: Mutex<Vec<(String, serde_json::Value)>>,
    fail: AtomicBool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::Relaxed);
    }

    pub fn on_topic(&self, topic: &str) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl StreamPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), ExportError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(ExportError::Publish("injected failure".into()));
        }
        let value = serde_json::from_slice(payload).expect("payload is JSON");
        self.sent.lock().unwrap().push((topic.to_string(), value));
        Ok(())
    }
}
