//! Shared protocol models
//!
//! Device classes, power states, version reports, and the handful of wire
//! constants this library sends itself. The full CEC opcode table is
//! deliberately not reproduced; the envelope is opcode-agnostic.

use std::fmt;

use crate::error::ProtocolError;

/// CEC device class, as carried in the adapter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DeviceType {
    /// Television
    Tv = 0,
    /// Recording device (default for a control adapter)
    RecordingDevice = 1,
    /// Reserved slot
    Reserved = 2,
    /// Tuner
    Tuner = 3,
    /// Playback device
    PlaybackDevice = 4,
    /// Audio system
    AudioSystem = 5,
}

impl TryFrom<u8> for DeviceType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DeviceType::Tv),
            1 => Ok(DeviceType::RecordingDevice),
            2 => Ok(DeviceType::Reserved),
            3 => Ok(DeviceType::Tuner),
            4 => Ok(DeviceType::PlaybackDevice),
            5 => Ok(DeviceType::AudioSystem),
            other => Err(ProtocolError::InvalidDeviceType(other)),
        }
    }
}

/// Five-valued power status a device reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerStatus {
    /// Powered on
    On,
    /// In standby
    Standby,
    /// Waking up
    TransitionStandbyToOn,
    /// Going to standby
    TransitionOnToStandby,
    /// Status could not be determined
    Unknown,
}

/// CEC protocol version a device reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CecVersion {
    /// CEC 1.2
    V1_2,
    /// CEC 1.2a
    V1_2a,
    /// CEC 1.3
    V1_3,
    /// CEC 1.3a
    V1_3a,
    /// CEC 1.4
    V1_4,
    /// Version could not be determined
    Unknown,
}

impl fmt::Display for CecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CecVersion::V1_2 => "1.2",
            CecVersion::V1_2a => "1.2a",
            CecVersion::V1_3 => "1.3",
            CecVersion::V1_3a => "1.3a",
            CecVersion::V1_4 => "1.4",
            CecVersion::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Device menu UI state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MenuState {
    /// Menu opened
    Activated,
    /// Menu closed
    Deactivated,
}

/// Alert conditions raised by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlertKind {
    /// Adapter needs servicing
    ServiceDevice,
    /// Connection to the adapter was lost
    ConnectionLost,
    /// Insufficient permissions to open the adapter
    PermissionError,
    /// Adapter port is held by another process
    PortBusy,
    /// Physical address could not be determined
    PhysicalAddressError,
    /// TV stopped answering polls
    TvPollFailed,
}

/// Opcodes this library emits itself
pub mod opcode {
    /// Wake the target device
    pub const IMAGE_VIEW_ON: u8 = 0x04;
    /// Put the target device into standby
    pub const STANDBY: u8 = 0x36;
    /// Remote-control button pressed
    pub const USER_CONTROL_PRESSED: u8 = 0x44;
    /// Remote-control button released
    pub const USER_CONTROL_RELEASE: u8 = 0x45;
}

/// User-control codes for the input-selection convenience commands
pub mod user_control {
    /// Select AV input function
    pub const SELECT_AV_INPUT: u8 = 0x69;
    /// Select audio input function
    pub const SELECT_AUDIO_INPUT: u8 = 0x6A;
}

/// Severity bits carried with LOG events
pub mod log_level {
    /// Error conditions
    pub const ERROR: i32 = 1;
    /// Warnings
    pub const WARNING: i32 = 2;
    /// Notices
    pub const NOTICE: i32 = 4;
    /// Bus traffic
    pub const TRAFFIC: i32 = 8;
    /// Debug chatter
    pub const DEBUG: i32 = 16;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_accepts_the_defined_range() {
        for raw in 0..=5u8 {
            assert!(DeviceType::try_from(raw).is_ok());
        }
        assert!(DeviceType::try_from(6).is_err());
    }

    #[test]
    fn cec_version_renders_the_report_strings() {
        assert_eq!(CecVersion::V1_3a.to_string(), "1.3a");
        assert_eq!(CecVersion::V1_4.to_string(), "1.4");
        assert_eq!(CecVersion::Unknown.to_string(), "Unknown");
    }
}
