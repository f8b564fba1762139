//! # netwatch-core
//!
//! Foundation layer for the netwatch agent: the event model shared by
//! capture and export, the aggregation state, and the hand-off queue
//! between the capture thread and the processing task.
//!
//! ### Key Submodules:
//! - `events`: decoded packets, canonical event records, drop-on-full hand-off queue
//! - `stats`: cumulative traffic frequency tables with top-N ranking
//! - `batch`: the upload batch buffer with swap-on-flush semantics
//! - `time`: clock abstraction so expiry logic is testable

pub mod batch;
pub mod events;
pub mod stats;
pub mod time;

pub mod prelude {
    pub use crate::batch::BatchBuffer;
    pub use crate::events::normalize::{AgentMeta, EventNormalizer, PacketEvent};
    pub use crate::events::packet::{DecodedPacket, NetworkMeta, TransportMeta};
    pub use crate::events::queue::PacketQueue;
    pub use crate::stats::TrafficStats;
    pub use crate::time::{Clock, SystemClock, VirtualClock};
}
