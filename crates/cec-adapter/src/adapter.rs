//! Adapter handle
//!
//! [`Adapter`] owns one open connection to a CEC engine together with the
//! callback registry its subscribers live in. Opening installs the
//! notification sink and applies the adapter configuration before the
//! transport comes up, so no notification can be lost between open and
//! subscription setup. Handles are cheap to clone; the engine connection
//! closes when the last handle is dropped or when [`close`](Adapter::close)
//! is called explicitly.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cec_protocol::{
    CecCommand, DeviceType, EventSet, LogicalAddress, PhysicalAddress,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::device::Device;
use crate::dispatch::Dispatcher;
use crate::engine::{AdapterDescriptor, CecEngine, EngineConfig};
use crate::error::CecError;
use crate::registry::{CallbackRegistry, Handler};

/// Initial discovery probe size; re-probed with the exact count when the
/// engine reports more
const INITIAL_PROBE_CAPACITY: usize = 10;

/// CEC client version this library reports
const CLIENT_CEC_VERSION: &str = "1.4";

/// Locally-configured adapter identity
///
/// OSD name and language are reported from this record rather than polled
/// from the bus; they describe how the adapter presents itself, not a
/// device property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// OSD name announced on the bus
    pub osd_name: String,
    /// Device class to claim
    pub device_type: DeviceType,
    /// Menu language code
    pub language: String,
    /// Whether to claim the active source on open
    pub activate_source: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            osd_name: "cec-adapter".to_string(),
            device_type: DeviceType::RecordingDevice,
            language: "eng".to_string(),
            activate_source: false,
        }
    }
}

impl AdapterConfig {
    /// The engine-side form of this configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            osd_name: self.osd_name.clone(),
            device_type: self.device_type,
            language: self.language.clone(),
            activate_source: self.activate_source,
        }
    }
}

/// Target of a stream-path routing request
///
/// Either a device whose physical address is resolved at call time, or a
/// physical address given directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPath {
    /// Route to the device at this logical address
    Device(LogicalAddress),
    /// Route to this physical address
    Address(PhysicalAddress),
}

impl From<LogicalAddress> for StreamPath {
    fn from(address: LogicalAddress) -> Self {
        StreamPath::Device(address)
    }
}

impl From<PhysicalAddress> for StreamPath {
    fn from(address: PhysicalAddress) -> Self {
        StreamPath::Address(address)
    }
}

/// Enumerate every adapter the engine can discover
///
/// Probes with a small initial capacity and re-probes with the exact
/// reported count when the first pass saw more.
pub fn list_adapters(engine: &dyn CecEngine) -> Vec<AdapterDescriptor> {
    let first = engine.discover(INITIAL_PROBE_CAPACITY);
    if first.total <= INITIAL_PROBE_CAPACITY {
        return first.adapters;
    }
    debug!(total = first.total, "discovery exceeded probe capacity, re-probing");
    engine.discover(first.total).adapters
}

pub(crate) struct AdapterInner {
    pub(crate) engine: Arc<dyn CecEngine>,
    registry: Arc<CallbackRegistry>,
    config: AdapterConfig,
    path: String,
    open: AtomicBool,
}

impl AdapterInner {
    pub(crate) fn ensure_open(&self) -> Result<(), CecError> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(CecError::AdapterClosed)
        }
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            self.engine.close();
            info!(path = %self.path, "closed CEC adapter");
        }
    }
}

impl Drop for AdapterInner {
    fn drop(&mut self) {
        self.close();
    }
}

/// Handle to one open CEC engine connection
///
/// Cloning yields another handle to the same connection; the connection
/// closes when the last handle drops. A closed handle stays valid, but
/// every engine-touching operation on it fails with
/// [`CecError::AdapterClosed`].
#[derive(Clone)]
pub struct Adapter {
    inner: Arc<AdapterInner>,
}

impl Adapter {
    /// Open a connection to the CEC engine
    ///
    /// Installs the notification sink and applies `config` before the
    /// transport opens. With no explicit `path`, discovery runs and the
    /// first adapter found is selected; an empty discovery is
    /// [`CecError::NoAdapterFound`].
    pub fn open(
        engine: Arc<dyn CecEngine>,
        path: Option<&str>,
        config: AdapterConfig,
    ) -> Result<Adapter, CecError> {
        let registry = Arc::new(CallbackRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry)));
        engine.register_notifications(dispatcher);

        if !engine.apply_configuration(&config.engine_config()) {
            return Err(CecError::InitFailed);
        }

        let path = match path {
            Some(path) => path.to_string(),
            None => {
                let first = list_adapters(engine.as_ref())
                    .into_iter()
                    .next()
                    .ok_or(CecError::NoAdapterFound)?;
                debug!(path = %first.path, "selected first discovered adapter");
                first.path
            }
        };

        if !engine.open(&path) {
            return Err(CecError::OpenFailed { path });
        }
        info!(path = %path, osd_name = %config.osd_name, "opened CEC adapter");

        Ok(Adapter {
            inner: Arc::new(AdapterInner {
                engine,
                registry,
                config,
                path,
                open: AtomicBool::new(true),
            }),
        })
    }

    /// Release the engine connection
    ///
    /// Idempotent; the handle stays valid but engine-touching operations
    /// fail with [`CecError::AdapterClosed`] afterwards.
    pub fn close(&self) {
        self.inner.close();
    }

    /// Whether this handle's connection is still open
    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    /// Subscribe `handler` to the event kinds in `mask`
    ///
    /// The registry holds the handler for its registered lifetime;
    /// matching events reach it in registration order.
    pub fn add_callback(&self, mask: EventSet, handler: Handler) -> Result<(), CecError> {
        self.inner.registry.add(mask, handler)
    }

    /// Unsubscribe `handler` from the event kinds in `mask`
    ///
    /// Subtracts `mask` from every registration matching the handler's
    /// identity; registrations whose mask empties are dropped. Unknown
    /// handlers are a no-op.
    pub fn remove_callback(&self, handler: &Handler, mask: EventSet) {
        self.inner.registry.remove(handler, mask);
    }

    /// Transmit one command on the bus
    ///
    /// With `initiator` omitted the adapter's primary address is resolved
    /// at call time; it can change when the bus topology changes.
    /// `Ok(false)` means the bus rejected the frame; that is an outcome,
    /// not an error.
    pub fn transmit(
        &self,
        destination: LogicalAddress,
        opcode: u8,
        parameters: impl Into<Vec<u8>>,
        initiator: Option<LogicalAddress>,
    ) -> Result<bool, CecError> {
        self.inner.ensure_open()?;
        let initiator = match initiator {
            Some(address) => address,
            None => self.inner.engine.logical_addresses().primary,
        };
        let command = CecCommand::new(initiator, destination, opcode, parameters)?;
        trace!(%initiator, %destination, opcode = command.opcode, "transmit");
        Ok(self.inner.engine.transmit(&command))
    }

    /// Snapshot every active device on the bus
    ///
    /// All-or-nothing: if any snapshot fails, the whole call fails and no
    /// partial map is returned.
    pub fn list_devices(&self) -> Result<BTreeMap<LogicalAddress, Device>, CecError> {
        self.inner.ensure_open()?;
        let active = self.inner.engine.active_devices();
        let mut devices = BTreeMap::new();
        for (raw, present) in active.iter().enumerate() {
            if !present {
                continue;
            }
            let address = LogicalAddress::new(raw as u8)?;
            devices.insert(address, Device::from_inner(&self.inner, address)?);
        }
        Ok(devices)
    }

    /// Snapshot the device at `address`
    pub fn device(&self, address: LogicalAddress) -> Result<Device, CecError> {
        Device::from_inner(&self.inner, address)
    }

    /// The adapter's current primary logical address
    ///
    /// A live engine read; not cached.
    pub fn logical_address(&self) -> Result<LogicalAddress, CecError> {
        self.inner.ensure_open()?;
        Ok(self.inner.engine.logical_addresses().primary)
    }

    /// The adapter's current physical address
    pub fn physical_address(&self) -> Result<PhysicalAddress, CecError> {
        self.inner.ensure_open()?;
        let primary = self.inner.engine.logical_addresses().primary;
        Ok(self.inner.engine.device_physical_address(primary))
    }

    /// The adapter's vendor id as six uppercase hex digits
    pub fn vendor_id(&self) -> Result<String, CecError> {
        self.inner.ensure_open()?;
        let primary = self.inner.engine.logical_addresses().primary;
        Ok(format!("{:06X}", self.inner.engine.device_vendor_id(primary)))
    }

    /// The configured OSD name
    pub fn osd_name(&self) -> &str {
        &self.inner.config.osd_name
    }

    /// The configured menu language
    pub fn language(&self) -> &str {
        &self.inner.config.language
    }

    /// The CEC version this client implements
    pub fn cec_version(&self) -> &'static str {
        CLIENT_CEC_VERSION
    }

    /// Path the transport was opened at
    pub fn device_path(&self) -> &str {
        &self.inner.path
    }

    /// Whether the device at `address` is the active source
    pub fn is_active_source(&self, address: LogicalAddress) -> Result<bool, CecError> {
        self.inner.ensure_open()?;
        Ok(self.inner.engine.is_active_source(address))
    }

    /// Claim the active source as `device_type`
    pub fn set_active_source(&self, device_type: DeviceType) -> Result<bool, CecError> {
        self.inner.ensure_open()?;
        Ok(self.inner.engine.set_active_source(device_type))
    }

    /// Route the HDMI stream path
    ///
    /// A [`StreamPath::Device`] target has its physical address resolved
    /// from the engine at call time.
    pub fn set_stream_path(&self, path: impl Into<StreamPath>) -> Result<bool, CecError> {
        self.inner.ensure_open()?;
        let address = match path.into() {
            StreamPath::Address(address) => address,
            StreamPath::Device(device) => self.inner.engine.device_physical_address(device),
        };
        Ok(self.inner.engine.set_stream_path(address))
    }

    /// Override the adapter's own physical address
    pub fn set_physical_address(&self, address: PhysicalAddress) -> Result<bool, CecError> {
        self.inner.ensure_open()?;
        Ok(self.inner.engine.set_physical_address(address))
    }

    /// Set the upstream HDMI port on `device`
    pub fn set_hdmi_port(&self, device: LogicalAddress, port: u8) -> Result<bool, CecError> {
        self.inner.ensure_open()?;
        if port > 15 {
            return Err(CecError::InvalidHdmiPort(port));
        }
        Ok(self.inner.engine.set_hdmi_port(device, port))
    }

    /// Send a volume-up keypress to the audio system
    pub fn volume_up(&self) -> Result<bool, CecError> {
        self.inner.ensure_open()?;
        Ok(self.inner.engine.volume_up())
    }

    /// Send a volume-down keypress to the audio system
    pub fn volume_down(&self) -> Result<bool, CecError> {
        self.inner.ensure_open()?;
        Ok(self.inner.engine.volume_down())
    }

    /// Toggle mute on the audio system
    pub fn toggle_mute(&self) -> Result<bool, CecError> {
        self.inner.ensure_open()?;
        Ok(self.inner.engine.toggle_mute())
    }

    /// Whether the adapter can persist its configuration
    pub fn can_persist_config(&self) -> Result<bool, CecError> {
        self.inner.ensure_open()?;
        Ok(self.inner.engine.can_persist_configuration())
    }

    /// Persist the engine's current configuration to the adapter
    ///
    /// Reads the current configuration back from the engine and writes it
    /// as the persisted configuration.
    pub fn persist_config(&self) -> Result<bool, CecError> {
        self.inner.ensure_open()?;
        if !self.inner.engine.can_persist_configuration() {
            return Err(CecError::PersistNotSupported);
        }
        let config = self
            .inner
            .engine
            .current_configuration()
            .ok_or(CecError::ConfigUnavailable)?;
        Ok(self.inner.engine.persist_configuration(&config))
    }

    pub(crate) fn inner(&self) -> &Arc<AdapterInner> {
        &self.inner
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("path", &self.inner.path)
            .field("open", &self.is_open())
            .finish()
    }
}
