//! In-memory stand-in for FTDI bit-bang interfaces.
//!
//! A `MockBus` holds one shadow register per physical interface. It is
//! selected through configuration (`interface = "mock"`) for tests and for
//! running on machines without the DSM serial board. Clones share state, so
//! a test can keep a handle to the bus and inspect or disturb the registers
//! behind a `HardwareInterface`.

use crate::address::InterfaceKey;
use crate::error::{Error, Result};
use log::{debug, trace};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MockRegister {
    pins: u8,
    direction: u8,
    open: bool,
    fail_reads: bool,
    fail_writes: bool,
}

#[derive(Debug, Default)]
struct BusState {
    registers: HashMap<InterfaceKey, MockRegister>,
    absent: HashSet<InterfaceKey>,
    opens: HashMap<InterfaceKey, usize>,
    closes: HashMap<InterfaceKey, usize>,
}

/// Shared set of mock interfaces. Every interface is present unless marked
/// absent with [`MockBus::set_present`].
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<BusState>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens `key` in bit-bang mode with the given pin directions.
    pub fn open(&self, key: &InterfaceKey, direction: u8) -> Result<MockPort> {
        let mut state = self.lock();
        if state.absent.contains(key) {
            return Err(Error::DeviceNotFound {
                product: key.product.clone(),
                interface: key.interface.letter(),
                message: "mock interface marked absent".to_string(),
            });
        }
        let register = state.registers.entry(key.clone()).or_default();
        register.direction = direction;
        register.open = true;
        *state.opens.entry(key.clone()).or_insert(0) += 1;
        debug!("Mock interface {} opened, pins=0x{:02X}", key, direction);
        Ok(MockPort {
            bus: self.clone(),
            key: key.clone(),
        })
    }

    /// Marks an interface present or absent. Absent interfaces fail to open.
    pub fn set_present(&self, key: &InterfaceKey, present: bool) {
        let mut state = self.lock();
        if present {
            state.absent.remove(key);
        } else {
            state.absent.insert(key.clone());
        }
    }

    /// Current raw byte of an interface, if it was ever opened or set.
    pub fn pins(&self, key: &InterfaceKey) -> Option<u8> {
        self.lock().registers.get(key).map(|r| r.pins)
    }

    /// Overwrites the raw byte of an interface, as external hardware would
    /// (e.g. a button press or another process writing the chip).
    pub fn set_pins(&self, key: &InterfaceKey, pins: u8) {
        self.lock().registers.entry(key.clone()).or_default().pins = pins;
    }

    /// Makes subsequent reads of `key` fail (or succeed again).
    pub fn fail_reads(&self, key: &InterfaceKey, fail: bool) {
        self.lock().registers.entry(key.clone()).or_default().fail_reads = fail;
    }

    /// Makes subsequent writes to `key` fail (or succeed again).
    pub fn fail_writes(&self, key: &InterfaceKey, fail: bool) {
        self.lock().registers.entry(key.clone()).or_default().fail_writes = fail;
    }

    /// Number of times `key` has been opened.
    pub fn open_count(&self, key: &InterfaceKey) -> usize {
        self.lock().opens.get(key).copied().unwrap_or(0)
    }

    /// Number of times `key` has been closed.
    pub fn close_count(&self, key: &InterfaceKey) -> usize {
        self.lock().closes.get(key).copied().unwrap_or(0)
    }

    pub fn is_open(&self, key: &InterfaceKey) -> bool {
        self.lock().registers.get(key).is_some_and(|r| r.open)
    }
}

/// An open mock interface.
#[derive(Debug)]
pub struct MockPort {
    bus: MockBus,
    key: InterfaceKey,
}

impl MockPort {
    pub fn read_pins(&mut self) -> Result<u8> {
        let state = self.bus.lock();
        let register = state
            .registers
            .get(&self.key)
            .ok_or_else(|| Error::InterfaceClosed {
                key: self.key.clone(),
            })?;
        if register.fail_reads {
            return Err(Error::Injected(format!("read of {}", self.key)));
        }
        trace!("Mock {} read 0x{:02X}", self.key, register.pins);
        Ok(register.pins)
    }

    /// Writes the output pins. Pins configured as inputs keep their level.
    pub fn write_pins(&mut self, pins: u8) -> Result<()> {
        let mut state = self.bus.lock();
        let register = state
            .registers
            .get_mut(&self.key)
            .ok_or_else(|| Error::InterfaceClosed {
                key: self.key.clone(),
            })?;
        if register.fail_writes {
            return Err(Error::Injected(format!("write of {}", self.key)));
        }
        register.pins = (register.pins & !register.direction) | (pins & register.direction);
        trace!("Mock {} wrote 0x{:02X}", self.key, register.pins);
        Ok(())
    }

    pub fn close(self) {
        let mut state = self.bus.lock();
        if let Some(register) = state.registers.get_mut(&self.key) {
            register.open = false;
        }
        *state.closes.entry(self.key.clone()).or_insert(0) += 1;
        debug!("Mock interface {} closed", self.key);
    }

    pub fn key(&self) -> &InterfaceKey {
        &self.key
    }
}
