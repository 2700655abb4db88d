//! CEC bus addressing
//!
//! Logical addresses name one of the sixteen device slots on the bus.
//! Physical addresses encode the HDMI topology position as four nibbles,
//! conventionally written `a.b.c.d`.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// A 4-bit CEC logical address (0-15)
///
/// Address 15 is the broadcast address by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogicalAddress(u8);

impl LogicalAddress {
    /// The TV, always address 0
    pub const TV: LogicalAddress = LogicalAddress(0);
    /// The first recording device
    pub const RECORDING_DEVICE_1: LogicalAddress = LogicalAddress(1);
    /// The audio system
    pub const AUDIO_SYSTEM: LogicalAddress = LogicalAddress(5);
    /// The broadcast address
    pub const BROADCAST: LogicalAddress = LogicalAddress(15);

    /// Validate a raw address value
    pub fn new(raw: u8) -> Result<Self, ProtocolError> {
        if raw > 15 {
            return Err(ProtocolError::InvalidLogicalAddress(i32::from(raw)));
        }
        Ok(LogicalAddress(raw))
    }

    /// The raw 4-bit value
    pub fn raw(&self) -> u8 {
        self.0
    }

    /// Whether this is the broadcast address
    pub fn is_broadcast(&self) -> bool {
        self.0 == 15
    }
}

impl TryFrom<i32> for LogicalAddress {
    type Error = ProtocolError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if !(0..=15).contains(&value) {
            return Err(ProtocolError::InvalidLogicalAddress(value));
        }
        Ok(LogicalAddress(value as u8))
    }
}

impl fmt::Display for LogicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 16-bit HDMI physical address
///
/// Parsed from and rendered as four dot-separated hex nibbles. Parsing is
/// strict: exactly four groups, each a hex value 0-F (case-insensitive).
/// A malformed string yields [`ProtocolError::InvalidPhysicalAddress`],
/// never a partial value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhysicalAddress(u16);

impl PhysicalAddress {
    /// Wrap a raw 16-bit address
    pub const fn new(raw: u16) -> Self {
        PhysicalAddress(raw)
    }

    /// The packed 16-bit value
    pub fn raw(&self) -> u16 {
        self.0
    }

    fn nibble(&self, shift: u16) -> u16 {
        (self.0 >> shift) & 0xF
    }
}

impl FromStr for PhysicalAddress {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidPhysicalAddress(s.to_string());

        let mut nibbles = [0u16; 4];
        let mut groups = s.split('.');
        for slot in nibbles.iter_mut() {
            let group = groups.next().ok_or_else(invalid)?;
            // from_str_radix tolerates a leading sign, so gate on hex digits
            if group.is_empty() || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            let value = u16::from_str_radix(group, 16).map_err(|_| invalid())?;
            if value > 0xF {
                return Err(invalid());
            }
            *slot = value;
        }
        if groups.next().is_some() {
            return Err(invalid());
        }

        Ok(PhysicalAddress(
            (nibbles[0] << 12) | (nibbles[1] << 8) | (nibbles[2] << 4) | nibbles[3],
        ))
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:x}.{:x}.{:x}.{:x}",
            self.nibble(12),
            self.nibble(8),
            self.nibble(4),
            self.nibble(0)
        )
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn parse(s: &str) -> Result<PhysicalAddress, ProtocolError> {
        s.parse()
    }

    #[test]
    fn parses_each_nibble_position() {
        assert_eq!(parse("0.0.0.0").unwrap().raw(), 0x0000);
        assert_eq!(parse("F.0.0.0").unwrap().raw(), 0xF000);
        assert_eq!(parse("0.F.0.0").unwrap().raw(), 0x0F00);
        assert_eq!(parse("0.0.F.0").unwrap().raw(), 0x00F0);
        assert_eq!(parse("0.0.0.F").unwrap().raw(), 0x000F);
        assert_eq!(parse("F.F.F.F").unwrap().raw(), 0xFFFF);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(parse("f.f.f.f").unwrap(), parse("F.F.F.F").unwrap());
        assert_eq!(parse("a.B.c.D").unwrap().raw(), 0xABCD);
    }

    #[test]
    fn rejects_negative_tokens() {
        for s in ["-1.0.0.0", "0.-1.0.0", "0.0.-1.0", "0.0.0.-1"] {
            assert_eq!(
                parse(s),
                Err(ProtocolError::InvalidPhysicalAddress(s.to_string()))
            );
        }
    }

    #[test]
    fn rejects_malformed_strings() {
        for s in ["foo", "", "1.2.3", "1.2.3.4.5", "1..2.3", "1.2.3.g", "+1.0.0.0"] {
            assert!(parse(s).is_err(), "expected {s:?} to be rejected");
        }
    }

    #[test]
    fn rejects_out_of_range_nibbles() {
        assert!(parse("10.0.0.0").is_err());
        assert!(parse("0.0.0.1F").is_err());
    }

    #[test]
    fn logical_address_range() {
        assert!(LogicalAddress::new(0).is_ok());
        assert!(LogicalAddress::new(15).is_ok());
        assert!(LogicalAddress::new(16).is_err());
        assert!(LogicalAddress::try_from(-1).is_err());
        assert!(LogicalAddress::try_from(16).is_err());
        assert_eq!(LogicalAddress::try_from(5).unwrap().raw(), 5);
    }

    #[test]
    fn broadcast_is_fifteen() {
        assert!(LogicalAddress::BROADCAST.is_broadcast());
        assert!(!LogicalAddress::TV.is_broadcast());
    }

    proptest! {
        #[test]
        fn display_round_trips(raw in 0u16..=0xFFFF) {
            let addr = PhysicalAddress::new(raw);
            let parsed: PhysicalAddress = addr.to_string().parse().unwrap();
            prop_assert_eq!(parsed, addr);
        }

        #[test]
        fn parse_round_trips_uppercase(a in 0u16..=0xF, b in 0u16..=0xF, c in 0u16..=0xF, d in 0u16..=0xF) {
            let s = format!("{a:X}.{b:X}.{c:X}.{d:X}");
            let parsed: PhysicalAddress = s.parse().unwrap();
            prop_assert_eq!(parsed.to_string(), s.to_lowercase());
        }
    }
}
