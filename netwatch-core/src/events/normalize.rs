//! Normalization of decoded packets into canonical event records.
//!
//! A [`PacketEvent`] is the single event shape every downstream consumer
//! sees: the streaming bus, the batch collector, and the aggregate
//! counters all work from it. Fields describing a protocol layer are
//! populated only when that layer was present on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::packet::{DecodedPacket, TransportMeta};

/// Maximum number of characters of payload text carried per event.
pub const MAX_PAYLOAD_CHARS: usize = 200;

/// Static identity stamped onto every normalized event.
#[derive(Debug, Clone)]
pub struct AgentMeta {
    pub agent_id: String,
    pub host_name: String,
    pub interface: String,
}

/// Canonical per-packet record.
///
/// Serializes with camelCase keys; absent layers are omitted entirely
/// rather than sent as nulls. The protocol number crosses the wire as a
/// decimal string, which is what the collector stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketEvent {
    pub agent_id: String,
    pub host_name: String,
    pub interface_name: String,
    pub timestamp: DateTime<Utc>,
    pub length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp_flags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udp_len: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

/// Builds [`PacketEvent`]s from decoded packets for one agent.
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    meta: AgentMeta,
}

impl EventNormalizer {
    pub fn new(meta: AgentMeta) -> Self {
        Self { meta }
    }

    pub fn meta(&self) -> &AgentMeta {
        &self.meta
    }

    /// Normalizes one decoded packet into the canonical record.
    ///
    /// Layer fields mirror layer presence exactly: no network header
    /// means no `srcIp`/`dstIp`/`protocol`, no transport header means
    /// no port fields. Payload text is sanitized and capped.
    pub fn normalize(&self, packet: &DecodedPacket) -> PacketEvent {
        let mut event = PacketEvent {
            agent_id: self.meta.agent_id.clone(),
            host_name: self.meta.host_name.clone(),
            interface_name: self.meta.interface.clone(),
            timestamp: packet.timestamp,
            length: packet.length,
            src_ip: None,
            dst_ip: None,
            protocol: None,
            src_port: None,
            dst_port: None,
            tcp_flags: None,
            udp_len: None,
            payload: None,
        };

        if let Some(net) = &packet.network {
            event.src_ip = Some(net.src_ip.to_string());
            event.dst_ip = Some(net.dst_ip.to_string());
            event.protocol = Some(net.protocol.to_string());
        }

        match &packet.transport {
            Some(TransportMeta::Tcp {
                src_port,
                dst_port,
                flags,
            }) => {
                event.src_port = Some(*src_port);
                event.dst_port = Some(*dst_port);
                event.tcp_flags = Some(flags.clone());
            }
            Some(TransportMeta::Udp {
                src_port,
                dst_port,
                length,
            }) => {
                event.src_port = Some(*src_port);
                event.dst_port = Some(*dst_port);
                event.udp_len = Some(*length);
            }
            None => {}
        }

        if let Some(raw) = &packet.payload {
            event.payload = sanitize_payload(raw);
        }

        event
    }
}

/// Extracts payload text permissively: invalid UTF-8 sequences and NUL
/// bytes are dropped, remaining characters keep their order, and the
/// result is capped at [`MAX_PAYLOAD_CHARS`] characters. Payloads with
/// nothing printable left collapse to `None`.
fn sanitize_payload(raw: &[u8]) -> Option<String> {
    let mut cleaned = String::new();
    let mut kept = 0;

    'chunks: for chunk in raw.utf8_chunks() {
        for c in chunk.valid().chars() {
            if c == '\0' {
                continue;
            }
            cleaned.push(c);
            kept += 1;
            if kept == MAX_PAYLOAD_CHARS {
                break 'chunks;
            }
        }
    }

    (!cleaned.is_empty()).then_some(cleaned)
}
