//! CEC command envelope
//!
//! [`CecCommand`] is the in-memory form of one CEC frame: source and
//! target logical addresses, the opcode byte, up to
//! [`MAX_DATA_PACKET_SIZE`] parameter bytes, and the ack/eom wire flags.
//! Once built a command is treated as immutable.

use crate::address::LogicalAddress;
use crate::error::ProtocolError;

/// Maximum number of parameter bytes in one CEC data packet
pub const MAX_DATA_PACKET_SIZE: usize = 64;

/// Default transmit timeout in milliseconds
pub const DEFAULT_TRANSMIT_TIMEOUT_MS: i32 = 1000;

/// Reject parameter buffers longer than `max` bytes
///
/// The error names the concrete maximum so callers can surface it.
pub fn validate_parameter_length(len: usize, max: usize) -> Result<(), ProtocolError> {
    if len > max {
        return Err(ProtocolError::TooManyParameters { len, max });
    }
    Ok(())
}

/// One CEC command frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CecCommand {
    /// Sending logical address
    pub initiator: LogicalAddress,
    /// Receiving logical address (15 broadcasts)
    pub destination: LogicalAddress,
    /// Command-type byte
    pub opcode: u8,
    /// Whether the frame carries an opcode at all (polling frames do not)
    pub opcode_set: bool,
    /// Parameter bytes, in wire order
    pub parameters: Vec<u8>,
    /// Acknowledge flag as seen on the wire
    pub ack: bool,
    /// End-of-message flag as seen on the wire
    pub eom: bool,
    /// Transmit timeout in milliseconds
    pub transmit_timeout: i32,
}

impl CecCommand {
    /// Build an outgoing command
    ///
    /// Parameter bytes are copied verbatim and in order. An oversized
    /// buffer is rejected, never truncated.
    pub fn new(
        initiator: LogicalAddress,
        destination: LogicalAddress,
        opcode: u8,
        parameters: impl Into<Vec<u8>>,
    ) -> Result<Self, ProtocolError> {
        let parameters = parameters.into();
        validate_parameter_length(parameters.len(), MAX_DATA_PACKET_SIZE)?;
        Ok(CecCommand {
            initiator,
            destination,
            opcode,
            opcode_set: true,
            parameters,
            ack: false,
            eom: false,
            transmit_timeout: DEFAULT_TRANSMIT_TIMEOUT_MS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> LogicalAddress {
        LogicalAddress::new(n).unwrap()
    }

    #[test]
    fn new_sets_opcode_and_copies_parameters() {
        let cmd = CecCommand::new(addr(1), addr(0), 0x44, vec![0x69, 0x02]).unwrap();
        assert!(cmd.opcode_set);
        assert_eq!(cmd.opcode, 0x44);
        assert_eq!(cmd.parameters, vec![0x69, 0x02]);
        assert!(!cmd.ack);
        assert!(!cmd.eom);
        assert_eq!(cmd.transmit_timeout, DEFAULT_TRANSMIT_TIMEOUT_MS);
    }

    #[test]
    fn new_accepts_a_full_packet() {
        let cmd = CecCommand::new(addr(1), addr(0), 0x00, vec![0u8; MAX_DATA_PACKET_SIZE]);
        assert!(cmd.is_ok());
    }

    #[test]
    fn new_rejects_oversized_parameters() {
        let err = CecCommand::new(addr(1), addr(0), 0x00, vec![0u8; MAX_DATA_PACKET_SIZE + 1])
            .unwrap_err();
        match err {
            ProtocolError::TooManyParameters { len, max } => {
                assert_eq!(len, MAX_DATA_PACKET_SIZE + 1);
                assert_eq!(max, MAX_DATA_PACKET_SIZE);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn length_error_reports_the_maximum() {
        let err = validate_parameter_length(100, MAX_DATA_PACKET_SIZE).unwrap_err();
        assert!(err.to_string().contains("64"));
    }
}
