//! CEC Protocol Library
//!
//! This crate provides the data model for HDMI-CEC bus control:
//!
//! - **Addressing**: 4-bit logical addresses (0-15, 15 broadcasts) and
//!   16-bit physical addresses in dotted nibble form (`1.0.0.0`)
//! - **Command envelope**: the generic CEC frame (initiator, destination,
//!   opcode, parameter bytes, ack/eom flags) with strict size validation
//! - **Events**: the seven asynchronous notification kinds an adapter can
//!   emit, and the bitmask type subscribers use to opt into them
//!
//! The envelope is deliberately opcode-agnostic: it carries the opcode
//! byte and parameters verbatim and does not model per-opcode semantics.
//!
//! # Example
//!
//! ```rust
//! use cec_protocol::{CecCommand, LogicalAddress, PhysicalAddress, models::opcode};
//!
//! let tv: PhysicalAddress = "1.0.0.0".parse().unwrap();
//! assert_eq!(tv.raw(), 0x1000);
//!
//! // Put the TV (address 0) into standby, sent from address 1.
//! let cmd = CecCommand::new(
//!     LogicalAddress::new(1).unwrap(),
//!     LogicalAddress::TV,
//!     opcode::STANDBY,
//!     vec![],
//! )
//! .unwrap();
//! assert!(cmd.opcode_set);
//! ```

pub mod address;
pub mod command;
pub mod error;
pub mod event;
pub mod models;

pub use address::{LogicalAddress, PhysicalAddress};
pub use command::{
    validate_parameter_length, CecCommand, DEFAULT_TRANSMIT_TIMEOUT_MS, MAX_DATA_PACKET_SIZE,
};
pub use error::ProtocolError;
pub use event::{CecEvent, EventSet};
pub use models::{AlertKind, CecVersion, DeviceType, MenuState, PowerStatus};
