//! Error types for CEC protocol validation

use thiserror::Error;

/// Errors produced while validating addresses and command envelopes
///
/// Every variant is detected before anything reaches an engine; a failed
/// validation never yields a partial value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// String did not match the four-nibble `a.b.c.d` form
    #[error("invalid physical address: {0:?}")]
    InvalidPhysicalAddress(String),

    /// Logical address outside 0-15
    #[error("logical address must be between 0 and 15, got {0}")]
    InvalidLogicalAddress(i32),

    /// Parameter buffer exceeds the packet size limit
    #[error("too many parameters ({len}), maximum is {max}")]
    TooManyParameters { len: usize, max: usize },

    /// Device type outside the defined range
    #[error("invalid CEC device type: {0}")]
    InvalidDeviceType(u8),
}
