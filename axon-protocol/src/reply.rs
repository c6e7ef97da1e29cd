//! Replies sent back to the host
//!
//! Every dispatched command and every safety trip produces a reply. Three
//! kinds exist: Ack (accepted, optional echo payload), Fault (rejected or
//! interlocked, carrying a fault code), Done (an operation ran to
//! completion, carrying a result payload).

use crate::settings::SETTINGS_LEN;
use heapless::Vec;

// Reply kind bytes
pub const REPLY_ACK: u8 = 0x06;
pub const REPLY_DONE: u8 = 0x04;
pub const REPLY_FAULT: u8 = 0x15;

// Fault code bytes
const FAULT_INVALID_PARAMETERS: u8 = 0x01;
const FAULT_HOME_DISABLED: u8 = 0x02;
const FAULT_LIMIT_1_TRIPPED: u8 = 0x03;
const FAULT_LIMIT_2_TRIPPED: u8 = 0x04;
const FAULT_NOT_ACKNOWLEDGED: u8 = 0x05;

/// Largest reply payload: the packed Settings record
pub const MAX_REPLY_PAYLOAD: usize = SETTINGS_LEN;
/// Largest encoded reply: kind byte plus payload
pub const MAX_REPLY_LEN: usize = 1 + MAX_REPLY_PAYLOAD;

/// Bounded reply payload buffer
pub type ReplyPayload = Vec<u8, MAX_REPLY_PAYLOAD>;

/// Reasons a command was rejected or an interlock tripped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultCode {
    /// Payload malformed or settings outside device limits
    InvalidParameters,
    /// Home command received while homing is disabled in settings
    HomeDisabled,
    /// Limit switch 1 tripped
    Limit1Tripped,
    /// Limit switch 2 tripped
    Limit2Tripped,
    /// Command not recognized or not permitted in the current mode
    NotAcknowledged,
}

impl FaultCode {
    /// Parse a fault code from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            FAULT_INVALID_PARAMETERS => Some(FaultCode::InvalidParameters),
            FAULT_HOME_DISABLED => Some(FaultCode::HomeDisabled),
            FAULT_LIMIT_1_TRIPPED => Some(FaultCode::Limit1Tripped),
            FAULT_LIMIT_2_TRIPPED => Some(FaultCode::Limit2Tripped),
            FAULT_NOT_ACKNOWLEDGED => Some(FaultCode::NotAcknowledged),
            _ => None,
        }
    }

    /// Convert to the wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            FaultCode::InvalidParameters => FAULT_INVALID_PARAMETERS,
            FaultCode::HomeDisabled => FAULT_HOME_DISABLED,
            FaultCode::Limit1Tripped => FAULT_LIMIT_1_TRIPPED,
            FaultCode::Limit2Tripped => FAULT_LIMIT_2_TRIPPED,
            FaultCode::NotAcknowledged => FAULT_NOT_ACKNOWLEDGED,
        }
    }
}

/// Errors from decoding a reply frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReplyError {
    /// Zero-length frame
    Empty,
    /// Kind byte does not name a reply
    UnknownKind,
    /// Fault code byte does not name a fault
    UnknownFault,
    /// Fault reply must carry exactly one code byte
    WrongLength,
    /// Payload exceeds `MAX_REPLY_PAYLOAD`
    PayloadTooLarge,
}

/// Replies sent to the host
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// Command accepted; payload echoes decoded arguments or query results
    Ack(ReplyPayload),
    /// Command rejected or a safety interlock tripped
    Fault(FaultCode),
    /// An operation ran to completion; payload carries the result
    Done(ReplyPayload),
}

impl Reply {
    /// Build an Ack carrying `payload` (at most `MAX_REPLY_PAYLOAD` bytes)
    pub fn ack(payload: &[u8]) -> Self {
        Reply::Ack(bounded(payload))
    }

    /// Build a Done carrying `payload` (at most `MAX_REPLY_PAYLOAD` bytes)
    pub fn done(payload: &[u8]) -> Self {
        Reply::Done(bounded(payload))
    }

    /// Encode into wire bytes: one kind byte, then the payload
    pub fn encode(&self) -> Vec<u8, MAX_REPLY_LEN> {
        let mut frame = Vec::new();
        match self {
            Reply::Ack(payload) => {
                let _ = frame.push(REPLY_ACK);
                let _ = frame.extend_from_slice(payload);
            }
            Reply::Fault(code) => {
                let _ = frame.push(REPLY_FAULT);
                let _ = frame.push(code.to_byte());
            }
            Reply::Done(payload) => {
                let _ = frame.push(REPLY_DONE);
                let _ = frame.extend_from_slice(payload);
            }
        }
        frame
    }

    /// Decode wire bytes (for hosts, simulators and tests)
    pub fn parse(frame: &[u8]) -> Result<Self, ReplyError> {
        let (&kind, payload) = frame.split_first().ok_or(ReplyError::Empty)?;
        match kind {
            REPLY_ACK => Ok(Reply::Ack(checked(payload)?)),
            REPLY_DONE => Ok(Reply::Done(checked(payload)?)),
            REPLY_FAULT => match payload {
                [code] => FaultCode::from_byte(*code)
                    .map(Reply::Fault)
                    .ok_or(ReplyError::UnknownFault),
                _ => Err(ReplyError::WrongLength),
            },
            _ => Err(ReplyError::UnknownKind),
        }
    }
}

fn bounded(payload: &[u8]) -> ReplyPayload {
    debug_assert!(payload.len() <= MAX_REPLY_PAYLOAD);
    let take = payload.len().min(MAX_REPLY_PAYLOAD);
    let mut buf = ReplyPayload::new();
    let _ = buf.extend_from_slice(&payload[..take]);
    buf
}

fn checked(payload: &[u8]) -> Result<ReplyPayload, ReplyError> {
    ReplyPayload::from_slice(payload).map_err(|_| ReplyError::PayloadTooLarge)
}
