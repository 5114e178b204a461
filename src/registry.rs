//! Reference-counted sharing of physical GPIO interfaces.
//!
//! Several logical devices live on the same 8-bit interface (two serial
//! ports per FT4232H interface, four relays plus two button/LED pairs on
//! another). The registry makes sure each interface is opened once, handed
//! out to every device that needs it, and closed when the last user lets go.
//!
//! Two locks are involved:
//!
//! * the registry lock guards the table of open interfaces and their
//!   reference counts, and is held across the native open and close;
//! * each [`SharedPort`] has its own lock that serializes byte I/O, so a
//!   read-modify-write by one device cannot interleave with another
//!   device's on the same interface.
//!
//! The registry lock is always taken before a port lock, never the other way.

use crate::address::{ChipInterface, InterfaceKey};
use crate::backend::{Backend, PortHandle};
use crate::error::{Error, Result};
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One open physical interface, shared by all leases on it.
#[derive(Debug)]
pub struct SharedPort {
    key: InterfaceKey,
    direction: u8,
    io: Mutex<Option<PortHandle>>,
}

impl SharedPort {
    pub fn key(&self) -> &InterfaceKey {
        &self.key
    }

    /// Pin directions the interface was opened with (1 = output).
    pub fn direction(&self) -> u8 {
        self.direction
    }

    /// Runs `f` with exclusive access to the open handle.
    pub fn with_handle<T>(&self, f: impl FnOnce(&mut PortHandle) -> Result<T>) -> Result<T> {
        let mut io = self.io.lock().unwrap_or_else(PoisonError::into_inner);
        match io.as_mut() {
            Some(handle) => f(handle),
            None => Err(Error::InterfaceClosed {
                key: self.key.clone(),
            }),
        }
    }

    pub fn read_pins(&self) -> Result<u8> {
        self.with_handle(|h| h.read_pins())
    }

    pub fn write_pins(&self, pins: u8) -> Result<()> {
        self.with_handle(|h| h.write_pins(pins))
    }

    /// Atomically replaces the interface byte with `update(current)`.
    /// Returns the byte that was written.
    pub fn modify(&self, update: impl FnOnce(u8) -> u8) -> Result<u8> {
        self.with_handle(|h| {
            let current = h.read_pins()?;
            let next = update(current);
            trace!("{}: 0x{:02X} -> 0x{:02X}", self.key, current, next);
            h.write_pins(next)?;
            Ok(next)
        })
    }

    fn close(&self) {
        let mut io = self.io.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = io.take() {
            debug!("Closing {}", handle.description());
            handle.close();
        }
    }
}

#[derive(Debug)]
struct Slot {
    port: Arc<SharedPort>,
    refs: usize,
}

#[derive(Debug)]
struct RegistryInner {
    backend: Backend,
    slots: Mutex<HashMap<InterfaceKey, Slot>>,
}

/// Table of currently open physical interfaces.
///
/// Cheap to clone; clones share the same table. Independent registries do
/// not see each other's interfaces.
#[derive(Debug, Clone)]
pub struct SharedInterfaceRegistry {
    inner: Arc<RegistryInner>,
}

impl SharedInterfaceRegistry {
    pub fn new(backend: Backend) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                backend,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<InterfaceKey, Slot>> {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Shares the interface `interface` of the chip named `product`,
    /// opening it if nobody holds it yet.
    pub fn acquire(&self, product: &str, interface: ChipInterface) -> Result<InterfaceLease> {
        self.acquire_key(&InterfaceKey::new(product, interface))
    }

    /// Like [`acquire`](Self::acquire), by key.
    pub fn acquire_key(&self, key: &InterfaceKey) -> Result<InterfaceLease> {
        let mut slots = self.slots();
        if let Some(slot) = slots.get_mut(key) {
            slot.refs += 1;
            debug!("Sharing {} (refs={})", key, slot.refs);
            return Ok(InterfaceLease {
                registry: self.clone(),
                port: Arc::clone(&slot.port),
            });
        }

        let direction = key.pin_direction();
        let handle = self.inner.backend.open(key, direction)?;
        debug!("Opened {} (refs=1)", handle.description());
        let port = Arc::new(SharedPort {
            key: key.clone(),
            direction,
            io: Mutex::new(Some(handle)),
        });
        slots.insert(
            key.clone(),
            Slot {
                port: Arc::clone(&port),
                refs: 1,
            },
        );
        Ok(InterfaceLease {
            registry: self.clone(),
            port,
        })
    }

    /// Gives up a lease. Same as dropping it.
    pub fn release(&self, lease: InterfaceLease) {
        drop(lease);
    }

    /// Decrements the reference count of `key`, closing the interface when it
    /// reaches zero. Unknown keys are ignored.
    fn release_key(&self, key: &InterfaceKey) {
        let mut slots = self.slots();
        let Some(slot) = slots.get_mut(key) else {
            trace!("Release of {} ignored, not open", key);
            return;
        };
        slot.refs = slot.refs.saturating_sub(1);
        debug!("Released {} (refs={})", key, slot.refs);
        if slot.refs == 0 {
            if let Some(slot) = slots.remove(key) {
                slot.port.close();
            }
        }
    }

    /// Number of leases currently held on `key`.
    pub fn ref_count(&self, key: &InterfaceKey) -> usize {
        self.slots().get(key).map_or(0, |s| s.refs)
    }

    /// Keys of all interfaces that are open, sorted.
    pub fn open_interfaces(&self) -> Vec<InterfaceKey> {
        let mut keys: Vec<InterfaceKey> = self.slots().keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// One share of an open physical interface. Dropping it releases the share.
#[derive(Debug)]
pub struct InterfaceLease {
    registry: SharedInterfaceRegistry,
    port: Arc<SharedPort>,
}

impl InterfaceLease {
    pub fn port(&self) -> &SharedPort {
        &self.port
    }

    pub fn key(&self) -> &InterfaceKey {
        self.port.key()
    }
}

impl Drop for InterfaceLease {
    fn drop(&mut self) {
        self.registry.release_key(self.port.key());
    }
}
