//! netwatch-capture
//!
//! Live packet acquisition for the netwatch agent: a pcap read loop on
//! the monitored interface feeding link/IP/transport decoding, yielding
//! one [`netwatch_core::events::packet::DecodedPacket`] per frame.

pub mod capture;
pub mod decode;
pub mod error;

pub use capture::run_capture_loop;
pub use error::CaptureError;
