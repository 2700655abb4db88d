//! Scriptable in-memory CEC engine
//!
//! [`SimEngine`] implements the [`CecEngine`] boundary entirely in memory:
//! a configurable adapter list, a per-address device table, and a record
//! of everything the adapter layer asked it to do. The `notify_*` methods
//! drive the installed notification sink exactly as a hardware engine's
//! callback threads would, and hand back the dispatch result so tests can
//! observe handler-failure propagation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use cec_adapter::{
    AdapterDescriptor, CecEngine, Discovery, DispatchError, EngineConfig, LogicalAddresses,
    NotificationSink,
};
use cec_protocol::models::{AlertKind, MenuState};
use cec_protocol::{
    CecCommand, CecVersion, DeviceType, LogicalAddress, PhysicalAddress, PowerStatus,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Properties of one simulated device on the bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimDeviceConfig {
    /// Vendor id reported for the device
    pub vendor_id: u64,
    /// Physical address reported for the device
    pub physical_address: PhysicalAddress,
    /// CEC version reported for the device
    pub cec_version: CecVersion,
    /// OSD name reported for the device
    pub osd_name: String,
    /// Menu language reported for the device
    pub menu_language: String,
    /// Power status reported for the device
    pub power_status: PowerStatus,
    /// Whether the device is the active source
    pub active_source: bool,
}

impl Default for SimDeviceConfig {
    fn default() -> Self {
        Self {
            vendor_id: 0,
            physical_address: PhysicalAddress::new(0x1000),
            cec_version: CecVersion::V1_4,
            osd_name: "Device".to_string(),
            menu_language: "eng".to_string(),
            power_status: PowerStatus::On,
            active_source: false,
        }
    }
}

/// One engine operation the adapter layer requested
///
/// Transmissions are recorded separately as full [`CecCommand`] frames;
/// this covers the device-scoped and routing operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimOp {
    /// Power on the device
    PowerOn(LogicalAddress),
    /// Put the device into standby
    Standby(LogicalAddress),
    /// Claim the active source
    SetActiveSource(DeviceType),
    /// Route the stream path
    SetStreamPath(PhysicalAddress),
    /// Override the adapter's physical address
    SetPhysicalAddress(PhysicalAddress),
    /// Set the upstream HDMI port on a device
    SetHdmiPort {
        /// Target device
        device: LogicalAddress,
        /// Port number
        port: u8,
    },
    /// Volume-up keypress to the audio system
    VolumeUp,
    /// Volume-down keypress to the audio system
    VolumeDown,
    /// Mute toggle to the audio system
    ToggleMute,
}

struct SimState {
    adapters: Vec<AdapterDescriptor>,
    devices: BTreeMap<LogicalAddress, SimDeviceConfig>,
    primary: LogicalAddress,
    open_path: Option<String>,
    open_result: bool,
    apply_result: bool,
    transmit_result: bool,
    op_result: bool,
    persist_supported: bool,
    persist_result: bool,
    current_config: Option<EngineConfig>,
    transmitted: Vec<CecCommand>,
    ops: Vec<SimOp>,
    persisted: Vec<EngineConfig>,
    probes: Vec<usize>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            adapters: Vec::new(),
            devices: BTreeMap::new(),
            primary: LogicalAddress::RECORDING_DEVICE_1,
            open_path: None,
            open_result: true,
            apply_result: true,
            transmit_result: true,
            op_result: true,
            persist_supported: true,
            persist_result: true,
            current_config: None,
            transmitted: Vec::new(),
            ops: Vec::new(),
            persisted: Vec::new(),
            probes: Vec::new(),
        }
    }
}

/// In-memory engine for testing adapter control without hardware
///
/// All configuration methods take `&self`; state lives behind a mutex so
/// a test can reconfigure the engine (change the primary address, flip
/// the transmit result) while an adapter holds it, and the `notify_*`
/// methods can be driven from a spawned thread to stand in for the
/// engine's own callback threads.
#[derive(Default)]
pub struct SimEngine {
    state: Mutex<SimState>,
    sink: RwLock<Option<Arc<dyn NotificationSink>>>,
}

impl SimEngine {
    /// Engine with no adapters and no devices
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine exposing a single discoverable adapter at `path`
    pub fn with_adapter(path: impl Into<String>) -> Self {
        let engine = Self::new();
        engine.add_adapter(AdapterDescriptor::new(path));
        engine
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sink(&self) -> Option<Arc<dyn NotificationSink>> {
        self.sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Add a discoverable adapter
    pub fn add_adapter(&self, descriptor: AdapterDescriptor) {
        self.state().adapters.push(descriptor);
    }

    /// Put a device on the bus, replacing any previous entry at `address`
    pub fn set_device(&self, address: LogicalAddress, config: SimDeviceConfig) {
        self.state().devices.insert(address, config);
    }

    /// Take a device off the bus
    pub fn remove_device(&self, address: LogicalAddress) {
        self.state().devices.remove(&address);
    }

    /// Change the adapter's primary logical address
    ///
    /// Visible to the next [`logical_addresses`](CecEngine::logical_addresses)
    /// query, the way a bus topology change would be.
    pub fn set_primary(&self, address: LogicalAddress) {
        self.state().primary = address;
    }

    /// Result the next [`open`](CecEngine::open) calls return
    pub fn set_open_result(&self, result: bool) {
        self.state().open_result = result;
    }

    /// Result [`apply_configuration`](CecEngine::apply_configuration) returns
    pub fn set_apply_result(&self, result: bool) {
        self.state().apply_result = result;
    }

    /// Result [`transmit`](CecEngine::transmit) returns
    pub fn set_transmit_result(&self, result: bool) {
        self.state().transmit_result = result;
    }

    /// Result the device-scoped and routing operations return
    pub fn set_op_result(&self, result: bool) {
        self.state().op_result = result;
    }

    /// Whether the engine claims it can persist configuration
    pub fn set_persist_supported(&self, supported: bool) {
        self.state().persist_supported = supported;
    }

    /// Result [`persist_configuration`](CecEngine::persist_configuration) returns
    pub fn set_persist_result(&self, result: bool) {
        self.state().persist_result = result;
    }

    /// Override the configuration reads return; `None` makes the read fail
    pub fn set_current_config(&self, config: Option<EngineConfig>) {
        self.state().current_config = config;
    }

    /// Every command transmitted so far, oldest first
    pub fn transmitted(&self) -> Vec<CecCommand> {
        self.state().transmitted.clone()
    }

    /// The most recently transmitted command
    pub fn last_transmitted(&self) -> Option<CecCommand> {
        self.state().transmitted.last().cloned()
    }

    /// Number of transmit calls seen
    pub fn transmit_count(&self) -> usize {
        self.state().transmitted.len()
    }

    /// Every non-transmit operation requested so far, oldest first
    pub fn ops(&self) -> Vec<SimOp> {
        self.state().ops.clone()
    }

    /// Every configuration persisted so far, oldest first
    pub fn persisted(&self) -> Vec<EngineConfig> {
        self.state().persisted.clone()
    }

    /// Capacities passed to [`discover`](CecEngine::discover), in order
    pub fn probes(&self) -> Vec<usize> {
        self.state().probes.clone()
    }

    /// The path the transport is currently open at
    pub fn opened_path(&self) -> Option<String> {
        self.state().open_path.clone()
    }

    /// Deliver a log message to the sink
    pub fn notify_log(&self, level: i32, time: i64, message: &[u8]) -> Result<(), DispatchError> {
        match self.sink() {
            Some(sink) => sink.log_message(level, time, message),
            None => Ok(()),
        }
    }

    /// Deliver a key press to the sink
    pub fn notify_key_press(&self, keycode: u8, duration: u32) -> Result<(), DispatchError> {
        match self.sink() {
            Some(sink) => sink.key_press(keycode, duration),
            None => Ok(()),
        }
    }

    /// Deliver a received command to the sink
    pub fn notify_command(&self, command: &CecCommand) -> Result<(), DispatchError> {
        match self.sink() {
            Some(sink) => sink.command_received(command),
            None => Ok(()),
        }
    }

    /// Deliver a configuration change to the sink
    pub fn notify_configuration_changed(
        &self,
        config: &EngineConfig,
    ) -> Result<(), DispatchError> {
        match self.sink() {
            Some(sink) => sink.configuration_changed(config),
            None => Ok(()),
        }
    }

    /// Deliver an alert to the sink
    pub fn notify_alert(
        &self,
        kind: AlertKind,
        param: Option<&str>,
    ) -> Result<(), DispatchError> {
        match self.sink() {
            Some(sink) => sink.alert(kind, param),
            None => Ok(()),
        }
    }

    /// Deliver a menu state change to the sink
    pub fn notify_menu_changed(&self, state: MenuState) -> Result<(), DispatchError> {
        match self.sink() {
            Some(sink) => sink.menu_state_changed(state),
            None => Ok(()),
        }
    }

    /// Deliver a source activation change to the sink
    pub fn notify_source_activated(
        &self,
        address: LogicalAddress,
        active: bool,
    ) -> Result<(), DispatchError> {
        match self.sink() {
            Some(sink) => sink.source_activated(address, active),
            None => Ok(()),
        }
    }

    fn record_op(&self, op: SimOp) -> bool {
        let mut state = self.state();
        state.ops.push(op);
        state.op_result
    }
}

impl CecEngine for SimEngine {
    fn discover(&self, capacity: usize) -> Discovery {
        let mut state = self.state();
        state.probes.push(capacity);
        Discovery {
            adapters: state.adapters.iter().take(capacity).cloned().collect(),
            total: state.adapters.len(),
        }
    }

    fn register_notifications(&self, sink: Arc<dyn NotificationSink>) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = Some(sink);
    }

    fn apply_configuration(&self, config: &EngineConfig) -> bool {
        let mut state = self.state();
        if state.apply_result {
            state.current_config = Some(config.clone());
        }
        state.apply_result
    }

    fn open(&self, path: &str) -> bool {
        let mut state = self.state();
        if !state.open_result {
            debug!(path, "simulated open failure");
            return false;
        }
        debug!(path, "simulated transport open");
        state.open_path = Some(path.to_string());
        true
    }

    fn close(&self) {
        let mut state = self.state();
        if state.open_path.take().is_some() {
            debug!("simulated transport closed");
        }
    }

    fn is_open(&self) -> bool {
        self.state().open_path.is_some()
    }

    fn transmit(&self, command: &CecCommand) -> bool {
        let mut state = self.state();
        trace!(
            initiator = %command.initiator,
            destination = %command.destination,
            opcode = command.opcode,
            "simulated transmit"
        );
        state.transmitted.push(command.clone());
        state.transmit_result
    }

    fn logical_addresses(&self) -> LogicalAddresses {
        let state = self.state();
        LogicalAddresses {
            primary: state.primary,
            mask: 1 << state.primary.raw(),
        }
    }

    fn active_devices(&self) -> [bool; 16] {
        let state = self.state();
        let mut active = [false; 16];
        for address in state.devices.keys() {
            active[address.raw() as usize] = true;
        }
        active
    }

    fn device_power_status(&self, address: LogicalAddress) -> PowerStatus {
        self.state()
            .devices
            .get(&address)
            .map(|d| d.power_status)
            .unwrap_or(PowerStatus::Unknown)
    }

    fn device_vendor_id(&self, address: LogicalAddress) -> u64 {
        self.state()
            .devices
            .get(&address)
            .map(|d| d.vendor_id)
            .unwrap_or(0)
    }

    fn device_physical_address(&self, address: LogicalAddress) -> PhysicalAddress {
        self.state()
            .devices
            .get(&address)
            .map(|d| d.physical_address)
            .unwrap_or(PhysicalAddress::new(0xFFFF))
    }

    fn device_cec_version(&self, address: LogicalAddress) -> CecVersion {
        self.state()
            .devices
            .get(&address)
            .map(|d| d.cec_version)
            .unwrap_or(CecVersion::Unknown)
    }

    fn device_osd_name(&self, address: LogicalAddress) -> String {
        self.state()
            .devices
            .get(&address)
            .map(|d| d.osd_name.clone())
            .unwrap_or_default()
    }

    fn device_menu_language(&self, address: LogicalAddress) -> String {
        self.state()
            .devices
            .get(&address)
            .map(|d| d.menu_language.clone())
            .unwrap_or_default()
    }

    fn power_on_devices(&self, address: LogicalAddress) -> bool {
        let result = self.record_op(SimOp::PowerOn(address));
        if result {
            if let Some(device) = self.state().devices.get_mut(&address) {
                device.power_status = PowerStatus::On;
            }
        }
        result
    }

    fn standby_devices(&self, address: LogicalAddress) -> bool {
        let result = self.record_op(SimOp::Standby(address));
        if result {
            if let Some(device) = self.state().devices.get_mut(&address) {
                device.power_status = PowerStatus::Standby;
            }
        }
        result
    }

    fn is_active_source(&self, address: LogicalAddress) -> bool {
        self.state()
            .devices
            .get(&address)
            .map(|d| d.active_source)
            .unwrap_or(false)
    }

    fn set_active_source(&self, device_type: DeviceType) -> bool {
        self.record_op(SimOp::SetActiveSource(device_type))
    }

    fn set_stream_path(&self, address: PhysicalAddress) -> bool {
        self.record_op(SimOp::SetStreamPath(address))
    }

    fn set_physical_address(&self, address: PhysicalAddress) -> bool {
        self.record_op(SimOp::SetPhysicalAddress(address))
    }

    fn set_hdmi_port(&self, device: LogicalAddress, port: u8) -> bool {
        self.record_op(SimOp::SetHdmiPort { device, port })
    }

    fn volume_up(&self) -> bool {
        self.record_op(SimOp::VolumeUp)
    }

    fn volume_down(&self) -> bool {
        self.record_op(SimOp::VolumeDown)
    }

    fn toggle_mute(&self) -> bool {
        self.record_op(SimOp::ToggleMute)
    }

    fn can_persist_configuration(&self) -> bool {
        self.state().persist_supported
    }

    fn current_configuration(&self) -> Option<EngineConfig> {
        self.state().current_config.clone()
    }

    fn persist_configuration(&self, config: &EngineConfig) -> bool {
        let mut state = self.state();
        state.persisted.push(config.clone());
        state.persist_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> LogicalAddress {
        LogicalAddress::new(n).unwrap()
    }

    #[test]
    fn with_adapter_is_discoverable() {
        let engine = SimEngine::with_adapter("/dev/fake0");
        let discovery = engine.discover(10);
        assert_eq!(discovery.total, 1);
        assert_eq!(discovery.adapters[0].path, "/dev/fake0");
    }

    #[test]
    fn discover_truncates_but_reports_the_total() {
        let engine = SimEngine::new();
        for i in 0..12 {
            engine.add_adapter(AdapterDescriptor::new(format!("/dev/cec{i}")));
        }

        let discovery = engine.discover(10);
        assert_eq!(discovery.adapters.len(), 10);
        assert_eq!(discovery.total, 12);
        assert_eq!(engine.probes(), vec![10]);
    }

    #[test]
    fn open_and_close_track_the_path() {
        let engine = SimEngine::with_adapter("/dev/fake0");
        assert!(!engine.is_open());

        assert!(engine.open("/dev/fake0"));
        assert!(engine.is_open());
        assert_eq!(engine.opened_path().as_deref(), Some("/dev/fake0"));

        engine.close();
        assert!(!engine.is_open());
        engine.close();
    }

    #[test]
    fn transmit_records_every_frame() {
        let engine = SimEngine::new();
        let cmd = CecCommand::new(addr(1), addr(0), 0x36, vec![]).unwrap();

        assert!(engine.transmit(&cmd));
        engine.set_transmit_result(false);
        assert!(!engine.transmit(&cmd));

        assert_eq!(engine.transmit_count(), 2);
        assert_eq!(engine.last_transmitted(), Some(cmd));
    }

    #[test]
    fn power_operations_update_the_device_table() {
        let engine = SimEngine::new();
        engine.set_device(
            addr(4),
            SimDeviceConfig {
                power_status: PowerStatus::Standby,
                ..Default::default()
            },
        );

        assert!(engine.power_on_devices(addr(4)));
        assert_eq!(engine.device_power_status(addr(4)), PowerStatus::On);

        assert!(engine.standby_devices(addr(4)));
        assert_eq!(engine.device_power_status(addr(4)), PowerStatus::Standby);

        assert_eq!(
            engine.ops(),
            vec![SimOp::PowerOn(addr(4)), SimOp::Standby(addr(4))]
        );
    }

    #[test]
    fn absent_devices_report_engine_defaults() {
        let engine = SimEngine::new();
        assert_eq!(engine.device_power_status(addr(9)), PowerStatus::Unknown);
        assert_eq!(engine.device_vendor_id(addr(9)), 0);
        assert_eq!(engine.device_physical_address(addr(9)).raw(), 0xFFFF);
        assert_eq!(engine.device_cec_version(addr(9)), CecVersion::Unknown);
        assert_eq!(engine.device_osd_name(addr(9)), "");
        assert!(!engine.is_active_source(addr(9)));
    }

    #[test]
    fn active_devices_follow_the_device_table() {
        let engine = SimEngine::new();
        engine.set_device(LogicalAddress::TV, SimDeviceConfig::default());
        engine.set_device(addr(5), SimDeviceConfig::default());

        let active = engine.active_devices();
        assert!(active[0]);
        assert!(active[5]);
        assert!(!active[1]);

        engine.remove_device(addr(5));
        assert!(!engine.active_devices()[5]);
    }

    #[test]
    fn primary_address_is_mutable_at_runtime() {
        let engine = SimEngine::new();
        assert_eq!(
            engine.logical_addresses().primary,
            LogicalAddress::RECORDING_DEVICE_1
        );

        engine.set_primary(addr(8));
        let addresses = engine.logical_addresses();
        assert_eq!(addresses.primary, addr(8));
        assert_eq!(addresses.mask, 1 << 8);
    }

    #[test]
    fn notifications_without_a_sink_succeed() {
        let engine = SimEngine::new();
        assert!(engine.notify_key_press(0x01, 0).is_ok());
        assert!(engine.notify_log(1, 0, b"msg").is_ok());
    }

    #[test]
    fn persist_records_the_configuration() {
        let engine = SimEngine::new();
        let config = EngineConfig {
            osd_name: "sim".to_string(),
            device_type: DeviceType::RecordingDevice,
            language: "eng".to_string(),
            activate_source: false,
        };

        assert!(engine.apply_configuration(&config));
        assert_eq!(engine.current_configuration(), Some(config.clone()));

        assert!(engine.persist_configuration(&config));
        assert_eq!(engine.persisted(), vec![config]);
    }
}
