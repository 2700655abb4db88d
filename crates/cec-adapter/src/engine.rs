//! The engine boundary
//!
//! The low-level CEC engine (hardware library or simulator) sits behind
//! the [`CecEngine`] trait: adapter discovery, transport open/close,
//! transmit, device property queries, and the notification slots the
//! engine fires from threads it owns. Everything above this trait is
//! engine-agnostic.

use std::sync::Arc;

use cec_protocol::models::{AlertKind, MenuState};
use cec_protocol::{
    CecCommand, CecVersion, DeviceType, LogicalAddress, PhysicalAddress, PowerStatus,
};
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Descriptor for one discoverable adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterDescriptor {
    /// Transport path (e.g. `/dev/ttyACM0`)
    pub path: String,
    /// USB vendor id, when known
    pub vendor_id: Option<u16>,
    /// USB product id, when known
    pub product_id: Option<u16>,
}

impl AdapterDescriptor {
    /// Descriptor with only a path
    pub fn new(path: impl Into<String>) -> Self {
        AdapterDescriptor {
            path: path.into(),
            vendor_id: None,
            product_id: None,
        }
    }
}

/// Result of one discovery probe
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Descriptors returned, at most the requested capacity
    pub adapters: Vec<AdapterDescriptor>,
    /// Total count the engine reported; may exceed the capacity
    pub total: usize,
}

/// The logical addresses claimed by the local adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalAddresses {
    /// Primary address, used as the default initiator. Can change when
    /// the bus topology changes.
    pub primary: LogicalAddress,
    /// Bitmask over every claimed address
    pub mask: u16,
}

/// Engine-side adapter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// OSD name announced on the bus
    pub osd_name: String,
    /// Device class to claim
    pub device_type: DeviceType,
    /// Menu language code
    pub language: String,
    /// Whether to claim the active source on open
    pub activate_source: bool,
}

/// Sink for the engine's asynchronous notifications
///
/// The engine invokes these slots from its own threads, possibly
/// concurrently with each other and with application calls. Each slot
/// returns the delivery result so a failing handler is reported at the
/// callback site instead of unwinding into the engine.
pub trait NotificationSink: Send + Sync {
    /// An engine log message; `message` is raw bytes, decoded lossily
    fn log_message(&self, level: i32, time: i64, message: &[u8]) -> Result<(), DispatchError>;

    /// A remote-control key press or release
    fn key_press(&self, keycode: u8, duration: u32) -> Result<(), DispatchError>;

    /// A raw CEC command received on the bus
    fn command_received(&self, command: &CecCommand) -> Result<(), DispatchError>;

    /// The engine configuration changed
    fn configuration_changed(&self, config: &EngineConfig) -> Result<(), DispatchError>;

    /// An engine alert; `param` is present only for string-typed
    /// alert parameters
    fn alert(&self, kind: AlertKind, param: Option<&str>) -> Result<(), DispatchError>;

    /// A device menu opened or closed
    fn menu_state_changed(&self, state: MenuState) -> Result<(), DispatchError>;

    /// A source was activated or deactivated
    fn source_activated(&self, address: LogicalAddress, active: bool)
        -> Result<(), DispatchError>;
}

/// The low-level CEC engine
///
/// Every method that reaches hardware is potentially blocking; callers
/// must not hold locks that would stall notification delivery while a
/// call is in flight.
pub trait CecEngine: Send + Sync {
    /// Probe for adapters, returning at most `capacity` descriptors along
    /// with the total count the probe saw
    fn discover(&self, capacity: usize) -> Discovery;

    /// Install the notification sink
    ///
    /// Must happen before [`open`](CecEngine::open) so no notification
    /// can be lost between open and subscription setup.
    fn register_notifications(&self, sink: Arc<dyn NotificationSink>);

    /// Apply the adapter configuration
    fn apply_configuration(&self, config: &EngineConfig) -> bool;

    /// Open the transport at `path`
    fn open(&self, path: &str) -> bool;

    /// Close the transport; safe to call when already closed
    fn close(&self);

    /// Whether the transport is open
    fn is_open(&self) -> bool;

    /// Transmit one command; `false` means the bus rejected it
    fn transmit(&self, command: &CecCommand) -> bool;

    /// The logical addresses currently claimed by this adapter
    fn logical_addresses(&self) -> LogicalAddresses;

    /// Bitmap of active devices, indexed by logical address
    fn active_devices(&self) -> [bool; 16];

    /// Power status of the device at `address`
    fn device_power_status(&self, address: LogicalAddress) -> PowerStatus;

    /// Vendor id of the device at `address` (0 when unknown)
    fn device_vendor_id(&self, address: LogicalAddress) -> u64;

    /// Physical address of the device at `address`
    fn device_physical_address(&self, address: LogicalAddress) -> PhysicalAddress;

    /// CEC version the device at `address` reports
    fn device_cec_version(&self, address: LogicalAddress) -> CecVersion;

    /// OSD name the device at `address` reports
    fn device_osd_name(&self, address: LogicalAddress) -> String;

    /// Menu language the device at `address` reports
    fn device_menu_language(&self, address: LogicalAddress) -> String;

    /// Power on the device at `address`
    fn power_on_devices(&self, address: LogicalAddress) -> bool;

    /// Put the device at `address` into standby
    fn standby_devices(&self, address: LogicalAddress) -> bool;

    /// Whether the device at `address` is the active source
    fn is_active_source(&self, address: LogicalAddress) -> bool;

    /// Claim the active source as the given device class
    fn set_active_source(&self, device_type: DeviceType) -> bool;

    /// Route the HDMI stream path to a physical address
    fn set_stream_path(&self, address: PhysicalAddress) -> bool;

    /// Override the adapter's own physical address
    fn set_physical_address(&self, address: PhysicalAddress) -> bool;

    /// Set the upstream HDMI port on the given device
    fn set_hdmi_port(&self, device: LogicalAddress, port: u8) -> bool;

    /// Send a volume-up keypress to the audio system
    fn volume_up(&self) -> bool;

    /// Send a volume-down keypress to the audio system
    fn volume_down(&self) -> bool;

    /// Toggle mute on the audio system
    fn toggle_mute(&self) -> bool;

    /// Whether the adapter can persist its configuration
    fn can_persist_configuration(&self) -> bool;

    /// Read the current engine configuration
    fn current_configuration(&self) -> Option<EngineConfig>;

    /// Write `config` as the persisted configuration
    fn persist_configuration(&self, config: &EngineConfig) -> bool;
}
