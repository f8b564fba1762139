//! Aggregate and liveness records as they appear on the bus.
//!
//! Count lists serialize as `[key, count]` pairs, which is what the
//! dashboard consumers unpack. Protocol numbers cross the wire as
//! decimal strings, matching the per-event `protocol` field.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Busiest source addresses since agent start.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkerSnapshot {
    pub agent_id: String,
    pub top_talkers: Vec<(String, u64)>,
}

impl TalkerSnapshot {
    pub fn new(agent_id: &str, talkers: Vec<(IpAddr, u64)>) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            top_talkers: talkers
                .into_iter()
                .map(|(ip, count)| (ip.to_string(), count))
                .collect(),
        }
    }
}

/// Busiest TCP/UDP ports since agent start.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSnapshot {
    pub agent_id: String,
    pub top_ports: Vec<(u16, u64)>,
}

impl PortSnapshot {
    pub fn new(agent_id: &str, ports: Vec<(u16, u64)>) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            top_ports: ports,
        }
    }
}

/// Full protocol mix since agent start. Unlike talkers and ports this
/// list is never truncated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSnapshot {
    pub agent_id: String,
    pub protocol_stats: Vec<(String, u64)>,
}

impl ProtocolSnapshot {
    pub fn new(agent_id: &str, protocols: Vec<(u8, u64)>) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            protocol_stats: protocols
                .into_iter()
                .map(|(proto, count)| (proto.to_string(), count))
                .collect(),
        }
    }
}

/// One liveness beacon.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRecord {
    pub agent_id: String,
    pub host_name: String,
    pub ip: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HeartbeatRecord {
    pub fn online(agent_id: &str, host_name: &str, ip: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            host_name: host_name.to_string(),
            ip: ip.to_string(),
            status: "online".to_string(),
            timestamp,
        }
    }
}
