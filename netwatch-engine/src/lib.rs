//! # Netwatch Engine
//!
//! Wires the agent together: the capture loop feeding the hand-off
//! queue, the processing pipeline draining it, and the heartbeat
//! channel running alongside.

pub mod error;
pub mod heartbeat;
pub mod host;
pub mod pipeline;
pub mod runtime;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::AgentError;
pub use pipeline::PacketPipeline;
pub use runtime::AgentRuntime;
