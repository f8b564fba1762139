//! Bounded hand-off between the capture thread and the pipeline task.
//!
//! The capture thread must never wait on the consumer: a frame that
//! arrives while the queue is full is discarded on the spot and the
//! loss is counted, so a slow pipeline costs coverage, not capture
//! throughput. Capacity is fixed at construction and bounds how far
//! the consumer can fall behind.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::packet::DecodedPacket;

/// Drop-on-full queue carrying decoded frames across threads.
///
/// Handles are cheap to clone via [`share`](Self::share); every handle
/// sees the same frames and the same drop count.
pub struct PacketQueue {
    tx: Sender<DecodedPacket>,
    rx: Receiver<DecodedPacket>,
    dropped: Arc<AtomicU64>,
}

impl PacketQueue {
    /// Creates a queue holding at most `capacity` frames.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            tx,
            rx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Another handle onto the same queue.
    pub fn share(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Enqueues one frame without blocking.
    ///
    /// Returns `false` when the queue is full: the frame is discarded
    /// and the drop count advances. The caller keeps capturing either
    /// way.
    pub fn push(&self, packet: DecodedPacket) -> bool {
        match self.tx.try_send(packet) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Dequeues the oldest frame, or `None` when nothing is waiting.
    pub fn pop(&self) -> Option<DecodedPacket> {
        self.rx.try_recv().ok()
    }

    /// Frames discarded so far because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
