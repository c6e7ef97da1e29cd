//! Frame queues pairing the controller with an interrupt-driven link
//!
//! The receive side (UART interrupt, USB callback) pushes complete frames
//! with `push_inbound`; the controller drains one per cycle through the
//! `Transport` trait and queues reply frames for the transmit side to pop.

use axon_core::traits::{CommandFrame, Transport};
use axon_protocol::MAX_REPLY_LEN;
use heapless::{Deque, Vec};

/// Frames the receive side can buffer before drops start
pub const INBOUND_DEPTH: usize = 4;

/// Reply frames buffered for transmission
pub const OUTBOUND_DEPTH: usize = 8;

/// One encoded reply frame
pub type ReplyFrame = Vec<u8, MAX_REPLY_LEN>;

pub struct QueueTransport {
    inbound: Deque<CommandFrame, INBOUND_DEPTH>,
    outbound: Deque<ReplyFrame, OUTBOUND_DEPTH>,
}

impl QueueTransport {
    pub fn new() -> Self {
        Self {
            inbound: Deque::new(),
            outbound: Deque::new(),
        }
    }

    /// Queue a received frame for the controller
    ///
    /// Returns false when the frame was dropped, either oversized or
    /// arriving while the queue is full.
    pub fn push_inbound(&mut self, frame: &[u8]) -> bool {
        match CommandFrame::from_slice(frame) {
            Ok(frame) => self.inbound.push_back(frame).is_ok(),
            Err(_) => false,
        }
    }

    /// Pop the next reply frame for transmission
    pub fn pop_outbound(&mut self) -> Option<ReplyFrame> {
        self.outbound.pop_front()
    }

    /// Reply frames waiting for transmission
    pub fn pending_replies(&self) -> usize {
        self.outbound.len()
    }
}

impl Default for QueueTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for QueueTransport {
    fn poll_frame(&mut self) -> Option<CommandFrame> {
        self.inbound.pop_front()
    }

    fn send(&mut self, frame: &[u8]) {
        if let Ok(frame) = ReplyFrame::from_slice(frame) {
            // A full outbound queue drops the oldest pending reply first;
            // the newest state is the one worth reporting
            if self.outbound.is_full() {
                self.outbound.pop_front();
            }
            let _ = self.outbound.push_back(frame);
        }
    }
}
