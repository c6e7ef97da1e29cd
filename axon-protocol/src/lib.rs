//! Axon host protocol
//!
//! This crate defines the command/reply vocabulary between a host and the
//! single-axis controller. Byte-level framing belongs to the transport;
//! what is defined here is the content of each deframed buffer: command
//! identifiers, payload layouts, reply kinds, fault codes, and the packed
//! Settings record exchanged byte-for-byte with the host.
//!
//! # Command set
//!
//! ```text
//! ┌─────┬──────────────────┬───────────────────────────────┐
//! │ ID  │ Command          │ Payload                       │
//! ├─────┼──────────────────┼───────────────────────────────┤
//! │ 'G' │ Goto             │ target position, i32 LE       │
//! │ 'S' │ Stop             │ none                          │
//! │ 'H' │ Home             │ direction flag, 1 byte        │
//! │ 'R' │ Reset            │ none                          │
//! │ 'Q' │ Query            │ kind: model/serial/parameters │
//! │ 'U' │ UpdateParameters │ packed Settings, 15 bytes     │
//! │ 'E' │ Echo             │ none                          │
//! └─────┴──────────────────┴───────────────────────────────┘
//! ```
//!
//! Replies are one kind byte plus a payload: Ack (0x06), Done (0x04), and
//! Fault (0x15, followed by one fault-code byte).

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod reply;
pub mod settings;

pub use command::{Command, DecodeError, QueryKind, MAX_COMMAND_LEN, MODEL_ID, SERIAL_ID};
pub use reply::{FaultCode, Reply, ReplyError, ReplyPayload, MAX_REPLY_LEN, MAX_REPLY_PAYLOAD};
pub use settings::{Settings, SettingsError, SETTINGS_LEN};
