//! Cumulative traffic frequency tables.
//!
//! Three dimensions are counted per observed packet: source IPs
//! ("talkers"), TCP/UDP ports, and IP protocol numbers. Counts grow
//! monotonically for the life of the process; there is no windowing or
//! reset, so published snapshots are cumulative-since-start.

use std::collections::HashMap;
use std::hash::Hash;
use std::net::IpAddr;

use crate::events::packet::{DecodedPacket, TransportMeta};

#[derive(Debug, Clone, Copy)]
struct CountEntry {
    count: u64,
    /// Insertion sequence, used to break count ties deterministically.
    first_seen: u64,
}

/// Frequency tables over everything the agent has seen.
#[derive(Debug, Default)]
pub struct TrafficStats {
    talkers: HashMap<IpAddr, CountEntry>,
    ports: HashMap<u16, CountEntry>,
    protocols: HashMap<u8, CountEntry>,
    seq: u64,
}

impl TrafficStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one decoded packet to every dimension it qualifies for.
    ///
    /// Talker and protocol tables count only packets with a network
    /// layer; the talker key is the source address. Port counts cover
    /// both endpoints of each TCP or UDP packet.
    pub fn observe(&mut self, packet: &DecodedPacket) {
        if let Some(net) = &packet.network {
            self.record_talker(net.src_ip);
            self.record_protocol(net.protocol);
        }

        match &packet.transport {
            Some(TransportMeta::Tcp {
                src_port, dst_port, ..
            })
            | Some(TransportMeta::Udp {
                src_port, dst_port, ..
            }) => {
                self.record_port(*src_port);
                self.record_port(*dst_port);
            }
            None => {}
        }
    }

    pub fn record_talker(&mut self, ip: IpAddr) {
        Self::bump(&mut self.talkers, &mut self.seq, ip);
    }

    pub fn record_port(&mut self, port: u16) {
        Self::bump(&mut self.ports, &mut self.seq, port);
    }

    pub fn record_protocol(&mut self, protocol: u8) {
        Self::bump(&mut self.protocols, &mut self.seq, protocol);
    }

    /// The `n` busiest source addresses, most active first.
    pub fn top_talkers(&self, n: usize) -> Vec<(IpAddr, u64)> {
        Self::ranked(&self.talkers, n)
    }

    /// The `n` busiest ports, most active first.
    pub fn top_ports(&self, n: usize) -> Vec<(u16, u64)> {
        Self::ranked(&self.ports, n)
    }

    /// Every observed protocol number with its count, busiest first.
    pub fn protocol_counts(&self) -> Vec<(u8, u64)> {
        Self::ranked(&self.protocols, self.protocols.len())
    }

    fn bump<K>(map: &mut HashMap<K, CountEntry>, seq: &mut u64, key: K)
    where
        K: Eq + Hash,
    {
        let entry = map.entry(key).or_insert(CountEntry {
            count: 0,
            first_seen: *seq,
        });
        entry.count += 1;
        *seq += 1;
    }

    /// Descending by count; equal counts rank in first-insertion order.
    fn ranked<K>(map: &HashMap<K, CountEntry>, n: usize) -> Vec<(K, u64)>
    where
        K: Copy,
    {
        let mut entries: Vec<(K, CountEntry)> = map.iter().map(|(k, e)| (*k, *e)).collect();
        entries.sort_by(|a, b| {
            b.1.count
                .cmp(&a.1.count)
                .then(a.1.first_seen.cmp(&b.1.first_seen))
        });
        entries
            .into_iter()
            .take(n)
            .map(|(k, e)| (k, e.count))
            .collect()
    }
}
