//! Event kinds and notification payloads
//!
//! An adapter emits seven kinds of asynchronous notifications. Each
//! subscriber opts into an arbitrary subset via an [`EventSet`] bitmask,
//! and receives the matching [`CecEvent`] payloads in registration order.

use bitflags::bitflags;

use crate::address::LogicalAddress;
use crate::command::CecCommand;
use crate::models::{AlertKind, MenuState};

bitflags! {
    /// Set of event kinds a subscriber opts into
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventSet: u16 {
        /// Engine log messages
        const LOG = 0x0001;
        /// Remote-control key presses
        const KEYPRESS = 0x0002;
        /// Raw CEC commands received on the bus
        const COMMAND = 0x0004;
        /// Adapter/library configuration changes
        const CONFIG_CHANGE = 0x0008;
        /// Engine alerts (connection lost, port busy, ...)
        const ALERT = 0x0010;
        /// Device menu state changes
        const MENU_CHANGED = 0x0020;
        /// Source activation/deactivation
        const ACTIVATED = 0x0040;
    }
}

impl EventSet {
    /// Every defined event kind
    pub const ALL: EventSet = EventSet::all();
    /// Bits accepted at subscription time; anything outside is rejected
    pub const VALID: EventSet = EventSet::all();
}

/// Payload of one notification
///
/// The variants mirror the seven [`EventSet`] bits one-to-one.
#[derive(Debug, Clone)]
pub enum CecEvent {
    /// An engine log message. `level` is a bitfield (see
    /// [`crate::models::log_level`]); invalid byte sequences in the
    /// original message are replaced during decoding, never an error.
    Log {
        /// Severity bitfield
        level: i32,
        /// Engine timestamp
        time: i64,
        /// Decoded message text
        message: String,
    },

    /// A remote-control key press or release
    KeyPress {
        /// User-control code
        keycode: u8,
        /// Press duration in milliseconds (0 while held)
        duration: u32,
    },

    /// A raw CEC command received on the bus
    Command(CecCommand),

    /// Reserved: the engine reports configuration changes, but no payload
    /// shape is defined yet and the dispatcher does not deliver this
    /// variant. See the dispatcher for details.
    ConfigChanged,

    /// An engine alert
    Alert {
        /// Alert condition
        kind: AlertKind,
        /// Present only for string-typed alert parameters
        param: Option<String>,
    },

    /// A device menu opened or closed
    MenuChanged {
        /// New menu state
        state: MenuState,
    },

    /// A source was activated or deactivated
    SourceActivated {
        /// Whether the source became active
        active: bool,
        /// Logical address of the source
        address: LogicalAddress,
    },
}

impl CecEvent {
    /// The [`EventSet`] bit this payload corresponds to
    pub fn kind(&self) -> EventSet {
        match self {
            CecEvent::Log { .. } => EventSet::LOG,
            CecEvent::KeyPress { .. } => EventSet::KEYPRESS,
            CecEvent::Command(_) => EventSet::COMMAND,
            CecEvent::ConfigChanged => EventSet::CONFIG_CHANGE,
            CecEvent::Alert { .. } => EventSet::ALERT,
            CecEvent::MenuChanged { .. } => EventSet::MENU_CHANGED,
            CecEvent::SourceActivated { .. } => EventSet::ACTIVATED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_covers_the_seven_kinds() {
        assert_eq!(EventSet::ALL.bits(), 0x007F);
        assert_eq!(EventSet::VALID, EventSet::ALL);
    }

    #[test]
    fn unknown_bits_are_representable_but_outside_valid() {
        let mask = EventSet::from_bits_retain(0x0100);
        assert!(!EventSet::VALID.contains(mask));
    }

    #[test]
    fn event_kind_matches_variant() {
        let event = CecEvent::KeyPress {
            keycode: 0x01,
            duration: 250,
        };
        assert_eq!(event.kind(), EventSet::KEYPRESS);

        let event = CecEvent::SourceActivated {
            active: true,
            address: LogicalAddress::TV,
        };
        assert_eq!(event.kind(), EventSet::ACTIVATED);
    }
}
