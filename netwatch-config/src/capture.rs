//! Packet capture configuration.
//!
//! Parameters for live packet acquisition on the monitored interface
//! and for the hand-off queue between the capture thread and the
//! processing task.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Packet capture configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CaptureConfig {
    /// Run in promiscuous mode?
    #[serde(default = "default_promiscuous")]
    pub promiscuous: bool,

    /// Capture snapshot length in bytes.
    #[validate(range(min = 64, max = 65535))]
    #[serde(default = "default_snaplen")]
    pub snaplen: u32,

    /// Capacity of the capture hand-off queue in frames.
    #[validate(range(min = 128, max = 1048576))]
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_promiscuous() -> bool {
    true
}

fn default_snaplen() -> u32 {
    65535
}

fn default_queue_capacity() -> usize {
    4096
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            promiscuous: default_promiscuous(),
            snaplen: default_snaplen(),
            queue_capacity: default_queue_capacity(),
        }
    }
}
