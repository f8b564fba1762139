//! # Netwatch Export
//!
//! Delivery paths out of the agent: the streaming bus publisher, the
//! authenticated batch uploader with its token cache, and the wire
//! shapes both paths speak.
//!
//! ### Key Submodules:
//! - `publish`: the [`StreamPublisher`] seam and its Kafka implementation
//! - `upload`: batch POST to the collector, gated by [`TokenCache`]
//! - `snapshot`: aggregate and heartbeat records as they cross the wire

pub mod error;
pub mod publish;
pub mod snapshot;
pub mod token;
pub mod upload;

pub use error::ExportError;
pub use publish::{KafkaPublisher, StreamPublisher};
pub use snapshot::{HeartbeatRecord, PortSnapshot, ProtocolSnapshot, TalkerSnapshot};
pub use token::TokenCache;
pub use upload::{BatchUploader, PacketBatch};
