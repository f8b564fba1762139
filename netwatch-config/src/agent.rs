//! Agent identity configuration.
//!
//! Identifies this capture agent to the backend and the message bus:
//! every event, batch and heartbeat carries the agent id.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Agent identity parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct AgentConfig {
    /// Stable identifier reported with every event and heartbeat.
    #[validate(length(min = 1, max = 64))]
    #[serde(default = "default_agent_id")]
    pub id: String,

    /// Network interface to monitor.
    #[validate(custom(function = validation::validate_interface))]
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Address reported in heartbeats. Discovered at startup when unset.
    #[serde(default)]
    pub address: Option<IpAddr>,
}

fn default_agent_id() -> String {
    "netwatch-agent".into()
}

fn default_interface() -> String {
    "eth0".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: default_agent_id(),
            interface: default_interface(),
            address: None,
        }
    }
}
