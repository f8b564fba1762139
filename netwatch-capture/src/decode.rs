//! Frame decoding: raw capture bytes into packet metadata.
//!
//! Only the layers a frame actually carries are reported; a frame with
//! no IP header yields no network metadata, and so on down the stack.

use std::net::IpAddr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use etherparse::err::packet::SliceError;
use etherparse::{NetSlice, SlicedPacket, TcpSlice, TransportSlice};

use netwatch_core::events::packet::{DecodedPacket, NetworkMeta, TransportMeta};

/// Decodes one Ethernet frame into a [`DecodedPacket`].
///
/// `orig_len` is the on-wire frame length from the capture header,
/// which can exceed `data.len()` when the snapshot length truncated
/// the frame.
pub fn decode_frame(
    timestamp: DateTime<Utc>,
    orig_len: u32,
    data: &[u8],
) -> Result<DecodedPacket, SliceError> {
    let sliced = SlicedPacket::from_ethernet(data)?;
    let mut packet = DecodedPacket::meta_only(timestamp, orig_len);

    match &sliced.net {
        Some(NetSlice::Ipv4(v4)) => {
            let header = v4.header();
            packet.network = Some(NetworkMeta {
                src_ip: IpAddr::V4(header.source_addr()),
                dst_ip: IpAddr::V4(header.destination_addr()),
                protocol: header.protocol().0,
            });
        }
        Some(NetSlice::Ipv6(v6)) => {
            let header = v6.header();
            packet.network = Some(NetworkMeta {
                src_ip: IpAddr::V6(header.source_addr()),
                dst_ip: IpAddr::V6(header.destination_addr()),
                protocol: header.next_header().0,
            });
        }
        None => {}
    }

    match &sliced.transport {
        Some(TransportSlice::Tcp(tcp)) => {
            packet.transport = Some(TransportMeta::Tcp {
                src_port: tcp.source_port(),
                dst_port: tcp.destination_port(),
                flags: tcp_flag_string(tcp),
            });
            if !tcp.payload().is_empty() {
                packet.payload = Some(Bytes::copy_from_slice(tcp.payload()));
            }
        }
        Some(TransportSlice::Udp(udp)) => {
            packet.transport = Some(TransportMeta::Udp {
                src_port: udp.source_port(),
                dst_port: udp.destination_port(),
                length: udp.length(),
            });
            if !udp.payload().is_empty() {
                packet.payload = Some(Bytes::copy_from_slice(udp.payload()));
            }
        }
        _ => {}
    }

    Ok(packet)
}

/// Flag letters in ascending bit order (FIN first), matching the
/// notation the collector already stores, e.g. "S", "SA", "PA".
fn tcp_flag_string(tcp: &TcpSlice) -> String {
    let mut flags = String::new();
    if tcp.fin() {
        flags.push('F');
    }
    if tcp.syn() {
        flags.push('S');
    }
    if tcp.rst() {
        flags.push('R');
    }
    if tcp.psh() {
        flags.push('P');
    }
    if tcp.ack() {
        flags.push('A');
    }
    if tcp.urg() {
        flags.push('U');
    }
    if tcp.ece() {
        flags.push('E');
    }
    if tcp.cwr() {
        flags.push('C');
    }
    flags
}
