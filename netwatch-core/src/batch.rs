//! Upload batch buffer.

use crate::events::normalize::PacketEvent;

/// Ordered buffer of normalized events awaiting batch upload.
///
/// The buffer itself is policy-free: callers append, read the length
/// against their flush threshold, and swap the whole contents out in
/// one move. Either every buffered event leaves together or none do.
#[derive(Debug, Default)]
pub struct BatchBuffer {
    events: Vec<PacketEvent>,
}

impl BatchBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event, preserving arrival order.
    pub fn push(&mut self, event: PacketEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Swaps out the entire contents, leaving the buffer empty.
    ///
    /// Intended to run inside the pipeline critical section so the
    /// upload I/O can happen after the lock is released.
    pub fn take_all(&mut self) -> Vec<PacketEvent> {
        std::mem::take(&mut self.events)
    }
}
