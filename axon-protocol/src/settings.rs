//! Operating parameter record shared byte-for-byte with the host
//!
//! The host reads and writes the whole record as one packed payload
//! (`Query(Parameters)` / `UpdateParameters`), so the layout here is a wire
//! contract: little-endian, fixed field order, one byte per flag.

/// Size of the packed Settings record in bytes
pub const SETTINGS_LEN: usize = 15;

/// Errors from decoding a Settings record off the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// Payload is not exactly `SETTINGS_LEN` bytes
    WrongLength,
    /// A flag byte held a value other than 0 or 1
    InvalidFlag,
}

/// Operating parameters for the axis
///
/// Field order matches the wire layout. Polarity flags are true when the
/// sensor reads high while triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    /// Motor current level while moving or homing (current-DAC units)
    pub run_current: u8,
    /// Motor current level while asleep
    pub sleep_current: u8,
    /// Microstep resolution (1, 2, 4, ... 128)
    pub microstep_res: u8,
    /// Idle time before entering Sleep, in device time units
    pub sleep_timeout: u16,
    /// Top speed in steps per second
    pub top_speed: u16,
    /// Acceleration in steps per second squared
    pub accel: u16,
    /// Limit switch 1 participates in the safety scan
    pub enable_lim1: bool,
    /// Limit switch 2 participates in the safety scan
    pub enable_lim2: bool,
    /// Homing is allowed and the home sensor is monitored
    pub enable_home: bool,
    /// Limit 1 trigger polarity (true = active high)
    pub lim1_polarity: bool,
    /// Limit 2 trigger polarity (true = active high)
    pub lim2_polarity: bool,
    /// Home sensor trigger polarity (true = active high)
    pub home_polarity: bool,
}

impl Settings {
    /// Pack into the wire layout
    pub fn to_bytes(&self) -> [u8; SETTINGS_LEN] {
        let mut raw = [0u8; SETTINGS_LEN];
        raw[0] = self.run_current;
        raw[1] = self.sleep_current;
        raw[2] = self.microstep_res;
        raw[3..5].copy_from_slice(&self.sleep_timeout.to_le_bytes());
        raw[5..7].copy_from_slice(&self.top_speed.to_le_bytes());
        raw[7..9].copy_from_slice(&self.accel.to_le_bytes());
        raw[9] = self.enable_lim1 as u8;
        raw[10] = self.enable_lim2 as u8;
        raw[11] = self.enable_home as u8;
        raw[12] = self.lim1_polarity as u8;
        raw[13] = self.lim2_polarity as u8;
        raw[14] = self.home_polarity as u8;
        raw
    }

    /// Unpack from the wire layout
    ///
    /// Rejects any slice that is not exactly `SETTINGS_LEN` bytes and any
    /// flag byte outside {0, 1}.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, SettingsError> {
        if raw.len() != SETTINGS_LEN {
            return Err(SettingsError::WrongLength);
        }

        Ok(Settings {
            run_current: raw[0],
            sleep_current: raw[1],
            microstep_res: raw[2],
            sleep_timeout: u16::from_le_bytes([raw[3], raw[4]]),
            top_speed: u16::from_le_bytes([raw[5], raw[6]]),
            accel: u16::from_le_bytes([raw[7], raw[8]]),
            enable_lim1: flag(raw[9])?,
            enable_lim2: flag(raw[10])?,
            enable_home: flag(raw[11])?,
            lim1_polarity: flag(raw[12])?,
            lim2_polarity: flag(raw[13])?,
            home_polarity: flag(raw[14])?,
        })
    }
}

fn flag(byte: u8) -> Result<bool, SettingsError> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(SettingsError::InvalidFlag),
    }
}
