//! The `HardwareInterface` facade.
//!
//! Resolves a device and a kind of control to a capability adapter, building
//! it on first request and returning the same adapter afterwards. Dropping
//! the facade drops the cached adapters, which releases their interface
//! shares; an interface closes when its last share is gone.

use crate::address::{AddressTable, InterfaceRole};
use crate::backend::Backend;
use crate::bitfield::BitfieldDevice;
use crate::config::HardwareConfig;
use crate::device::{self, HardwareDevice};
use crate::interfaces::{
    ButtonInterface, FtdiButton, FtdiOutput, FtdiSerialPort, OutputInterface,
    SerialPortInterface,
};
use crate::mock::MockBus;
use crate::registry::SharedInterfaceRegistry;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

type Cache<T> = Mutex<HashMap<HardwareDevice, Arc<T>>>;

/// Entry point for DSM hardware control.
#[derive(Debug)]
pub struct HardwareInterface {
    table: AddressTable,
    registry: SharedInterfaceRegistry,
    outputs: Cache<dyn OutputInterface>,
    serial_ports: Cache<dyn SerialPortInterface>,
    buttons: Cache<dyn ButtonInterface>,
}

impl HardwareInterface {
    /// A facade over `backend` using the DSM3 address table.
    pub fn new(backend: Backend) -> Self {
        Self::with_table(backend, AddressTable::dsm3())
    }

    /// A facade over `backend` using a custom address table.
    pub fn with_table(backend: Backend, table: AddressTable) -> Self {
        debug!("Hardware interface '{}' created", backend.name());
        Self {
            table,
            registry: SharedInterfaceRegistry::new(backend),
            outputs: Mutex::new(HashMap::new()),
            serial_ports: Mutex::new(HashMap::new()),
            buttons: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &HardwareConfig) -> Self {
        Self::new(config.backend())
    }

    /// A facade over shadow registers on `bus`.
    pub fn mock(bus: MockBus) -> Self {
        Self::new(Backend::Mock(bus))
    }

    /// Name of the backend: "ftdi", "mock" or "null".
    pub fn path(&self) -> &'static str {
        self.registry.backend().name()
    }

    pub fn table(&self) -> &AddressTable {
        &self.table
    }

    pub fn registry(&self) -> &SharedInterfaceRegistry {
        &self.registry
    }

    /// Devices with at least one entry in the address table.
    pub fn devices(&self) -> Vec<HardwareDevice> {
        HardwareDevice::devices()
            .into_iter()
            .filter(|d| self.table.entries().iter().any(|e| e.device == *d))
            .collect()
    }

    /// Looks up a device id among the devices this interface knows about.
    pub fn lookup_device(&self, id: &str) -> Option<HardwareDevice> {
        device::lookup_device_in(id, &self.devices())
    }

    /// Power switch, relay or LED of `device`, if it has one and its
    /// interface can be opened.
    pub fn get_output_interface(&self, device: HardwareDevice) -> Option<Arc<dyn OutputInterface>> {
        cached(&self.outputs, device, || {
            let bits = self.bitfield(device, InterfaceRole::PowerOutput)?;
            Some(Arc::new(FtdiOutput::new(bits)) as Arc<dyn OutputInterface>)
        })
    }

    /// Transceiver control of `device`, if it is a serial port and its
    /// interface can be opened.
    pub fn get_serial_port_interface(
        &self,
        device: HardwareDevice,
    ) -> Option<Arc<dyn SerialPortInterface>> {
        cached(&self.serial_ports, device, || {
            let bits = self.bitfield(device, InterfaceRole::PortConfig)?;
            Some(Arc::new(FtdiSerialPort::new(bits)) as Arc<dyn SerialPortInterface>)
        })
    }

    /// Button input of `device`, if it has one and its interface can be opened.
    pub fn get_button_interface(&self, device: HardwareDevice) -> Option<Arc<dyn ButtonInterface>> {
        cached(&self.buttons, device, || {
            let bits = self.bitfield(device, InterfaceRole::ButtonInput)?;
            Some(Arc::new(FtdiButton::new(bits)) as Arc<dyn ButtonInterface>)
        })
    }

    fn bitfield(&self, device: HardwareDevice, role: InterfaceRole) -> Option<BitfieldDevice> {
        let Some(entry) = self.table.lookup(device, role) else {
            debug!("{} has no {} interface", device, role);
            return None;
        };
        let lease = match self.registry.acquire(&entry.product, entry.interface) {
            Ok(lease) => lease,
            Err(e) => {
                debug!("{} {} unavailable: {}", device, role, e);
                return None;
            }
        };
        match BitfieldDevice::new(device, role, entry.mask, lease) {
            Ok(bits) => Some(bits),
            Err(e) => {
                debug!("{} {} unavailable: {}", device, role, e);
                None
            }
        }
    }
}

/// Returns the cached adapter for `device`, or builds and caches one.
/// Failures are not cached, so a later request tries again.
fn cached<T: ?Sized>(
    cache: &Cache<T>,
    device: HardwareDevice,
    make: impl FnOnce() -> Option<Arc<T>>,
) -> Option<Arc<T>> {
    let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = cache.get(&device) {
        return Some(Arc::clone(existing));
    }
    let created = make()?;
    cache.insert(device, Arc::clone(&created));
    Some(created)
}

impl Drop for HardwareInterface {
    fn drop(&mut self) {
        debug!("Hardware interface '{}' shutting down", self.path());
        clear(&mut self.outputs);
        clear(&mut self.serial_ports);
        clear(&mut self.buttons);
    }
}

fn clear<T: ?Sized>(cache: &mut Cache<T>) {
    cache
        .get_mut()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}
