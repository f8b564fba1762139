//! Event types and movement between pipeline stages.
//!
//! A frame enters as a [`packet::DecodedPacket`] (what the wire said),
//! crosses threads through the [`queue::PacketQueue`], and leaves
//! normalization as a [`normalize::PacketEvent`] (what downstream
//! consumers see).

pub mod normalize;
pub mod packet;
pub mod queue;

pub use normalize::{AgentMeta, EventNormalizer, PacketEvent};
pub use packet::{DecodedPacket, NetworkMeta, TransportMeta};
pub use queue::PacketQueue;
