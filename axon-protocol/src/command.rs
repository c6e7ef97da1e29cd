//! Host-facing command frames
//!
//! A command frame is one identifier byte followed by a payload whose length
//! is fixed per command. Frames arrive already deframed; identifiers are the
//! ASCII mnemonics of the operations.

use crate::reply::FaultCode;
use crate::settings::{Settings, SettingsError, SETTINGS_LEN};
use heapless::Vec;

// Command identifier bytes
pub const CMD_GOTO: u8 = b'G';
pub const CMD_STOP: u8 = b'S';
pub const CMD_HOME: u8 = b'H';
pub const CMD_RESET: u8 = b'R';
pub const CMD_QUERY: u8 = b'Q';
pub const CMD_UPDATE_PARAMETERS: u8 = b'U';
pub const CMD_ECHO: u8 = b'E';

// Query kind bytes
const QUERY_MODEL: u8 = 0x01;
const QUERY_SERIAL: u8 = 0x02;
const QUERY_PARAMETERS: u8 = 0x03;

/// Model identifier returned by `Query(Model)`, little-endian
pub const MODEL_ID: u16 = 0x0A10;
/// Serial identifier returned by `Query(Serial)`, little-endian
pub const SERIAL_ID: u32 = 0x2400_0001;

/// Largest command frame: identifier byte plus the packed Settings record
pub const MAX_COMMAND_LEN: usize = 1 + SETTINGS_LEN;

/// Read-only queries the host may issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueryKind {
    /// Device model identifier
    Model,
    /// Device serial identifier
    Serial,
    /// Committed settings, in the packed wire layout
    Parameters,
}

impl QueryKind {
    /// Parse a query kind from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            QUERY_MODEL => Some(QueryKind::Model),
            QUERY_SERIAL => Some(QueryKind::Serial),
            QUERY_PARAMETERS => Some(QueryKind::Parameters),
            _ => None,
        }
    }

    /// Convert to the wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            QueryKind::Model => QUERY_MODEL,
            QueryKind::Serial => QUERY_SERIAL,
            QueryKind::Parameters => QUERY_PARAMETERS,
        }
    }
}

/// Errors from decoding a command frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Zero-length frame
    Empty,
    /// Identifier byte does not name a command
    UnknownCommand,
    /// Payload length does not match the command
    WrongLength,
    /// Query kind byte does not name a supported query
    UnknownQuery,
    /// A flag byte held a value other than 0 or 1
    InvalidFlag,
    /// Settings payload failed to decode
    InvalidSettings(SettingsError),
}

impl From<SettingsError> for DecodeError {
    fn from(err: SettingsError) -> Self {
        DecodeError::InvalidSettings(err)
    }
}

impl DecodeError {
    /// The fault code reported to the host for this decode failure
    pub fn fault_code(self) -> FaultCode {
        match self {
            DecodeError::Empty | DecodeError::UnknownCommand | DecodeError::UnknownQuery => {
                FaultCode::NotAcknowledged
            }
            DecodeError::WrongLength
            | DecodeError::InvalidFlag
            | DecodeError::InvalidSettings(_) => FaultCode::InvalidParameters,
        }
    }
}

/// Commands accepted from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Move to an absolute step position
    Goto(i32),
    /// Decelerate to a halt
    Stop,
    /// Seek the home sensor; `forward` runs in the positive direction
    Home { forward: bool },
    /// Re-run boot validation and reinitialization
    Reset,
    /// Read-only device query
    Query(QueryKind),
    /// Replace the committed settings with a new record
    UpdateParameters(Settings),
    /// Liveness probe
    Echo,
}

impl Command {
    /// Decode a command frame
    pub fn parse(frame: &[u8]) -> Result<Self, DecodeError> {
        let (&id, payload) = frame.split_first().ok_or(DecodeError::Empty)?;
        match id {
            CMD_GOTO => {
                let raw: [u8; 4] = payload.try_into().map_err(|_| DecodeError::WrongLength)?;
                Ok(Command::Goto(i32::from_le_bytes(raw)))
            }
            CMD_STOP => {
                expect_empty(payload)?;
                Ok(Command::Stop)
            }
            CMD_HOME => match payload {
                [0] => Ok(Command::Home { forward: false }),
                [1] => Ok(Command::Home { forward: true }),
                [_] => Err(DecodeError::InvalidFlag),
                _ => Err(DecodeError::WrongLength),
            },
            CMD_RESET => {
                expect_empty(payload)?;
                Ok(Command::Reset)
            }
            CMD_QUERY => match payload {
                [kind] => QueryKind::from_byte(*kind)
                    .map(Command::Query)
                    .ok_or(DecodeError::UnknownQuery),
                _ => Err(DecodeError::WrongLength),
            },
            CMD_UPDATE_PARAMETERS => Ok(Command::UpdateParameters(Settings::from_bytes(payload)?)),
            CMD_ECHO => {
                expect_empty(payload)?;
                Ok(Command::Echo)
            }
            _ => Err(DecodeError::UnknownCommand),
        }
    }

    /// Encode into frame bytes (for hosts, simulators and tests)
    pub fn encode(&self) -> Vec<u8, MAX_COMMAND_LEN> {
        let mut frame = Vec::new();
        match self {
            Command::Goto(target) => {
                let _ = frame.push(CMD_GOTO);
                let _ = frame.extend_from_slice(&target.to_le_bytes());
            }
            Command::Stop => {
                let _ = frame.push(CMD_STOP);
            }
            Command::Home { forward } => {
                let _ = frame.push(CMD_HOME);
                let _ = frame.push(*forward as u8);
            }
            Command::Reset => {
                let _ = frame.push(CMD_RESET);
            }
            Command::Query(kind) => {
                let _ = frame.push(CMD_QUERY);
                let _ = frame.push(kind.to_byte());
            }
            Command::UpdateParameters(settings) => {
                let _ = frame.push(CMD_UPDATE_PARAMETERS);
                let _ = frame.extend_from_slice(&settings.to_bytes());
            }
            Command::Echo => {
                let _ = frame.push(CMD_ECHO);
            }
        }
        frame
    }
}

fn expect_empty(payload: &[u8]) -> Result<(), DecodeError> {
    if payload.is_empty() {
        Ok(())
    } else {
        Err(DecodeError::WrongLength)
    }
}
