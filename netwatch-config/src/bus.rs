//! Message bus and heartbeat configuration.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Streaming message bus parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct BusConfig {
    /// Comma-separated `host:port` bootstrap broker list.
    #[validate(custom(function = validation::validate_brokers))]
    #[serde(default = "default_brokers")]
    pub brokers: String,

    /// Transport-level send retries before a publish is reported failed.
    #[validate(range(min = 0, max = 10))]
    #[serde(default = "default_send_retries")]
    pub send_retries: u32,

    /// Topic names for the published streams.
    #[validate(nested)]
    #[serde(default)]
    pub topics: TopicsConfig,
}

fn default_brokers() -> String {
    "localhost:9092".into()
}

fn default_send_retries() -> u32 {
    3
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            send_retries: default_send_retries(),
            topics: TopicsConfig::default(),
        }
    }
}

/// Topic names, one per published stream.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct TopicsConfig {
    #[validate(custom(function = validation::validate_topic))]
    #[serde(default = "default_raw_packets")]
    pub raw_packets: String,

    #[validate(custom(function = validation::validate_topic))]
    #[serde(default = "default_top_talkers")]
    pub top_talkers: String,

    #[validate(custom(function = validation::validate_topic))]
    #[serde(default = "default_top_ports")]
    pub top_ports: String,

    #[validate(custom(function = validation::validate_topic))]
    #[serde(default = "default_protocol_stats")]
    pub protocol_stats: String,

    #[validate(custom(function = validation::validate_topic))]
    #[serde(default = "default_heartbeat")]
    pub heartbeat: String,
}

fn default_raw_packets() -> String {
    "netwatch.raw-packets".into()
}

fn default_top_talkers() -> String {
    "netwatch.top-talkers".into()
}

fn default_top_ports() -> String {
    "netwatch.top-ports".into()
}

fn default_protocol_stats() -> String {
    "netwatch.protocol-stats".into()
}

fn default_heartbeat() -> String {
    "netwatch.agent-heartbeat".into()
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            raw_packets: default_raw_packets(),
            top_talkers: default_top_talkers(),
            top_ports: default_top_ports(),
            protocol_stats: default_protocol_stats(),
            heartbeat: default_heartbeat(),
        }
    }
}

/// Heartbeat emission parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct HeartbeatConfig {
    /// Interval between heartbeat publications (seconds).
    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    10
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}
