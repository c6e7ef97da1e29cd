//! Transport implementations

pub mod queue;

pub use queue::{QueueTransport, ReplyFrame, INBOUND_DEPTH, OUTBOUND_DEPTH};
