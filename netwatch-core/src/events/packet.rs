//! Decoded packet metadata at the capture boundary.

use std::net::IpAddr;

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Network-layer metadata, present when the frame carried an IP header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkMeta {
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    /// IP protocol number (v4 protocol field / v6 next header).
    pub protocol: u8,
}

/// Transport-layer metadata. A frame carries at most one transport
/// header, so TCP and UDP fields can never coexist on one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportMeta {
    Tcp {
        src_port: u16,
        dst_port: u16,
        /// Flag letters in bit order, e.g. "S", "SA", "PA".
        flags: String,
    },
    Udp {
        src_port: u16,
        dst_port: u16,
        /// Value of the UDP length field (header + data).
        length: u16,
    },
}

/// A captured frame after link/network/transport decoding.
///
/// Layers that were not present on the wire stay `None`; nothing is
/// ever synthesized for them downstream.
#[derive(Debug, Clone)]
pub struct DecodedPacket {
    /// Capture timestamp.
    pub timestamp: DateTime<Utc>,
    /// Original frame length in bytes.
    pub length: u32,
    pub network: Option<NetworkMeta>,
    pub transport: Option<TransportMeta>,
    /// Raw application payload bytes, when any survived decoding.
    pub payload: Option<Bytes>,
}

impl DecodedPacket {
    /// Frame with capture metadata only (no decodable layers).
    pub fn meta_only(timestamp: DateTime<Utc>, length: u32) -> Self {
        Self {
            timestamp,
            length,
            network: None,
            transport: None,
            payload: None,
        }
    }
}
