//! A logical device's view of its bits within a shared interface byte.

use crate::address::{InterfaceKey, InterfaceRole};
use crate::device::HardwareDevice;
use crate::error::{Error, Result};
use crate::registry::InterfaceLease;
use log::trace;

/// Position of the lowest set bit of `mask`, or 8 if `mask` is zero.
#[inline]
pub fn shift_for_mask(mask: u8) -> u8 {
    mask.trailing_zeros() as u8
}

/// The interface byte after writing `value` into the field selected by
/// `mask`. Bits outside `mask` are taken from `current` unchanged; bits of
/// `value` that do not fit in the field are dropped.
#[inline]
pub fn apply_write(current: u8, mask: u8, value: u8) -> u8 {
    let shifted = ((value as u16) << shift_for_mask(mask)) as u8;
    (current & !mask) | (shifted & mask)
}

/// The field selected by `mask`, right justified.
#[inline]
pub fn extract_bits(byte: u8, mask: u8) -> u8 {
    ((byte & mask) as u16 >> shift_for_mask(mask)) as u8
}

/// Owns one share of a physical interface and the mask of the bits that
/// belong to one (device, role).
///
/// Mask and shift never change after construction. All I/O goes through the
/// interface's lock, so writes from devices sharing the byte cannot clobber
/// each other.
#[derive(Debug)]
pub struct BitfieldDevice {
    device: HardwareDevice,
    role: InterfaceRole,
    mask: u8,
    shift: u8,
    lease: InterfaceLease,
}

impl BitfieldDevice {
    /// Binds `mask` of the leased interface to `device` in `role`.
    pub fn new(
        device: HardwareDevice,
        role: InterfaceRole,
        mask: u8,
        lease: InterfaceLease,
    ) -> Result<Self> {
        if mask == 0 {
            return Err(Error::ZeroMask { device, role });
        }
        Ok(Self {
            device,
            role,
            mask,
            shift: shift_for_mask(mask),
            lease,
        })
    }

    pub fn device(&self) -> HardwareDevice {
        self.device
    }

    pub fn role(&self) -> InterfaceRole {
        self.role
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    pub fn shift(&self) -> u8 {
        self.shift
    }

    pub fn key(&self) -> &InterfaceKey {
        self.lease.key()
    }

    /// Writes `value` into this device's field, preserving every other bit
    /// of the interface byte.
    pub fn write_bits(&self, value: u8) -> Result<()> {
        let mask = self.mask;
        let written = self
            .lease
            .port()
            .modify(|current| apply_write(current, mask, value))?;
        trace!(
            "{} ({}) wrote 0x{:02X} under mask 0x{:02X}: byte=0x{:02X}",
            self.device,
            self.role,
            value,
            mask,
            written
        );
        Ok(())
    }

    /// Reads this device's field, right justified.
    pub fn read_bits(&self) -> Result<u8> {
        let byte = self.lease.port().read_pins()?;
        let value = extract_bits(byte, self.mask);
        trace!(
            "{} ({}) read byte=0x{:02X}, value=0x{:02X}",
            self.device,
            self.role,
            byte,
            value
        );
        Ok(value)
    }
}
