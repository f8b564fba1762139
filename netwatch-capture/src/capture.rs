//! Live capture loop.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use pcap::{Capture, Device};
use tracing::debug;

use netwatch_core::events::packet::DecodedPacket;

use crate::decode;
use crate::error::CaptureError;

/// Runs a live capture loop on the specified interface, invoking
/// `callback` once per captured frame. Blocks until `terminate` is set.
///
/// The pcap handle polls with a one second timeout so the terminate
/// flag is observed even on a quiet interface. Frames the decoder
/// rejects still reach the callback as meta-only records; a capture
/// agent must not lose frames to parse errors.
pub fn run_capture_loop<F>(
    interface: &str,
    snaplen: u32,
    promiscuous: bool,
    terminate: &AtomicBool,
    mut callback: F,
) -> Result<(), CaptureError>
where
    F: FnMut(DecodedPacket) + Send,
{
    let device = Device::list()?
        .into_iter()
        .find(|d| d.name == interface)
        .ok_or_else(|| CaptureError::DeviceNotFound(interface.to_string()))?;

    let mut cap = Capture::from_device(device)?
        .promisc(promiscuous)
        .snaplen(snaplen as i32)
        .timeout(1000) // ms; bounds how long termination takes
        .open()?;

    while !terminate.load(Ordering::Relaxed) {
        match cap.next_packet() {
            Ok(frame) => {
                let timestamp = capture_timestamp(frame.header.ts.tv_sec, frame.header.ts.tv_usec);
                let orig_len = frame.header.len;

                match decode::decode_frame(timestamp, orig_len, frame.data) {
                    Ok(packet) => callback(packet),
                    Err(e) => {
                        debug!("Undecodable frame ({} bytes): {e}", frame.data.len());
                        callback(DecodedPacket::meta_only(timestamp, orig_len));
                    }
                }
            }
            Err(pcap::Error::TimeoutExpired) => {
                // No frame in this timeout window; re-check terminate.
                continue;
            }
            Err(e) => return Err(CaptureError::from(e)),
        }
    }

    Ok(())
}

fn capture_timestamp(tv_sec: i64, tv_usec: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(tv_sec, (tv_usec as u32).saturating_mul(1_000))
        .single()
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_device_is_reported() {
        let terminate = AtomicBool::new(false);
        let result = run_capture_loop("netwatch-no-such-if", 65535, false, &terminate, |_| {});
        assert!(matches!(result, Err(CaptureError::DeviceNotFound(name)) if name == "netwatch-no-such-if"));
    }

    #[test]
    fn capture_timestamps_convert_exactly() {
        let ts = capture_timestamp(1_700_000_000, 250_000);
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_micros(), 250_000);
    }
}
