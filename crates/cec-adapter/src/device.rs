//! Device snapshot
//!
//! [`Device`] is a read-mostly, point-in-time snapshot of one logical
//! address's properties, captured in a single batch of engine queries at
//! construction. It holds only a weak reference back to its adapter, so a
//! snapshot never extends the connection's lifetime; device-scoped
//! commands fail with [`CecError::AdapterClosed`] once the adapter is
//! gone or closed.

use std::sync::{Arc, Weak};

use cec_protocol::models::{opcode, user_control};
use cec_protocol::{CecCommand, CecVersion, LogicalAddress, PhysicalAddress, PowerStatus};

use crate::adapter::{Adapter, AdapterInner};
use crate::error::CecError;

/// Snapshot of one logical device on the bus
///
/// Property accessors return the values captured at construction; they do
/// not re-poll the bus. The command methods delegate to the owning
/// adapter's engine connection.
#[derive(Clone, Debug)]
pub struct Device {
    adapter: Weak<AdapterInner>,
    address: LogicalAddress,
    vendor_id: String,
    physical_address: PhysicalAddress,
    cec_version: CecVersion,
    osd_name: String,
    menu_language: String,
}

impl Device {
    /// Snapshot the device at `address` through an open adapter
    pub fn new(adapter: &Adapter, address: LogicalAddress) -> Result<Self, CecError> {
        Device::from_inner(adapter.inner(), address)
    }

    pub(crate) fn from_inner(
        inner: &Arc<AdapterInner>,
        address: LogicalAddress,
    ) -> Result<Self, CecError> {
        inner.ensure_open()?;
        let engine = &inner.engine;
        Ok(Device {
            adapter: Arc::downgrade(inner),
            address,
            vendor_id: format!("{:06X}", engine.device_vendor_id(address)),
            physical_address: engine.device_physical_address(address),
            cec_version: engine.device_cec_version(address),
            osd_name: engine.device_osd_name(address),
            menu_language: engine.device_menu_language(address),
        })
    }

    fn live(&self) -> Result<Arc<AdapterInner>, CecError> {
        let inner = self.adapter.upgrade().ok_or(CecError::AdapterClosed)?;
        inner.ensure_open()?;
        Ok(inner)
    }

    /// Logical address this snapshot was taken at
    pub fn address(&self) -> LogicalAddress {
        self.address
    }

    /// Vendor id as six uppercase hex digits
    pub fn vendor_id(&self) -> &str {
        &self.vendor_id
    }

    /// Physical address at snapshot time
    pub fn physical_address(&self) -> PhysicalAddress {
        self.physical_address
    }

    /// CEC version the device reported
    pub fn cec_version(&self) -> CecVersion {
        self.cec_version
    }

    /// OSD name the device reported
    pub fn osd_name(&self) -> &str {
        &self.osd_name
    }

    /// Menu language the device reported
    pub fn menu_language(&self) -> &str {
        &self.menu_language
    }

    /// Whether the device is powered on
    ///
    /// Transition states map to the side they leave: a device going into
    /// standby still reads `true`, a device waking up still reads
    /// `false`. An unknown status is
    /// [`CecError::PowerStatusUnknown`], never a boolean.
    pub fn is_on(&self) -> Result<bool, CecError> {
        let inner = self.live()?;
        match inner.engine.device_power_status(self.address) {
            PowerStatus::On | PowerStatus::TransitionOnToStandby => Ok(true),
            PowerStatus::Standby | PowerStatus::TransitionStandbyToOn => Ok(false),
            PowerStatus::Unknown => Err(CecError::PowerStatusUnknown {
                address: self.address,
            }),
        }
    }

    /// Power the device on
    pub fn power_on(&self) -> Result<bool, CecError> {
        let inner = self.live()?;
        Ok(inner.engine.power_on_devices(self.address))
    }

    /// Put the device into standby
    pub fn standby(&self) -> Result<bool, CecError> {
        let inner = self.live()?;
        Ok(inner.engine.standby_devices(self.address))
    }

    /// Whether the device is the active source
    pub fn is_active(&self) -> Result<bool, CecError> {
        let inner = self.live()?;
        Ok(inner.engine.is_active_source(self.address))
    }

    /// Ask the device to select AV input `input`
    ///
    /// Emulates the remote control: USER_CONTROL_PRESSED with the
    /// select-AV-input function byte.
    pub fn set_av_input(&self, input: u8) -> Result<bool, CecError> {
        self.press_user_control(user_control::SELECT_AV_INPUT, input)
    }

    /// Ask the device to select audio input `input`
    pub fn set_audio_input(&self, input: u8) -> Result<bool, CecError> {
        self.press_user_control(user_control::SELECT_AUDIO_INPUT, input)
    }

    fn press_user_control(&self, function: u8, input: u8) -> Result<bool, CecError> {
        let inner = self.live()?;
        let initiator = inner.engine.logical_addresses().primary;
        let command = CecCommand::new(
            initiator,
            self.address,
            opcode::USER_CONTROL_PRESSED,
            vec![function, input],
        )?;
        Ok(inner.engine.transmit(&command))
    }

    /// Transmit a raw command to this device
    ///
    /// The initiator is the adapter's primary address, resolved at call
    /// time.
    pub fn transmit(&self, opcode: u8, parameters: impl Into<Vec<u8>>) -> Result<bool, CecError> {
        let inner = self.live()?;
        let initiator = inner.engine.logical_addresses().primary;
        let command = CecCommand::new(initiator, self.address, opcode, parameters)?;
        Ok(inner.engine.transmit(&command))
    }
}
