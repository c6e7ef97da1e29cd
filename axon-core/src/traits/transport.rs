//! Host transport trait

use axon_protocol::MAX_COMMAND_LEN;
use heapless::Vec;

/// A received command frame, already deframed
pub type CommandFrame = Vec<u8, MAX_COMMAND_LEN>;

/// Trait for the host link
///
/// Framing, checksums, and flow control belong to the implementation; the
/// controller sees whole command frames in and hands whole reply frames
/// out.
pub trait Transport {
    /// Take the next pending command frame, if one has arrived
    fn poll_frame(&mut self) -> Option<CommandFrame>;

    /// Queue an encoded reply frame for the host
    fn send(&mut self, frame: &[u8]);
}
