//! Static mapping from DSM devices to bits of the FTDI GPIO interfaces.

use crate::consts;
use crate::device::HardwareDevice;
use crate::error::{Error, Result};
use log::debug;
use std::fmt;

/// Purpose for which a device's bits are accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceRole {
    /// Serial transceiver mode and termination.
    PortConfig,
    /// Power switch, relay or LED.
    PowerOutput,
    /// Push button input.
    ButtonInput,
}

impl fmt::Display for InterfaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InterfaceRole::PortConfig => "port config",
            InterfaceRole::PowerOutput => "power output",
            InterfaceRole::ButtonInput => "button input",
        })
    }
}

/// One of the four sub-interfaces of an FT4232H.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChipInterface {
    A,
    B,
    C,
    D,
}

impl ChipInterface {
    #[inline]
    pub fn letter(&self) -> char {
        match self {
            ChipInterface::A => 'A',
            ChipInterface::B => 'B',
            ChipInterface::C => 'C',
            ChipInterface::D => 'D',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Some(ChipInterface::A),
            'B' => Some(ChipInterface::B),
            'C' => Some(ChipInterface::C),
            'D' => Some(ChipInterface::D),
            _ => None,
        }
    }
}

/// Identifies one physical 8-bit bit-bang GPIO byte: a chip (by EEPROM
/// product string) and one of its sub-interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceKey {
    pub product: String,
    pub interface: ChipInterface,
}

impl InterfaceKey {
    pub fn new(product: impl Into<String>, interface: ChipInterface) -> Self {
        Self {
            product: product.into(),
            interface,
        }
    }

    /// Fixed pin directions (1 = output) used when this interface is put into
    /// bit-bang mode.
    pub fn pin_direction(&self) -> u8 {
        if self.product == consts::PRODUCT_I2C && self.interface == ChipInterface::C {
            consts::pins::I2C_IFACE_C
        } else {
            consts::pins::ALL_OUTPUTS
        }
    }
}

impl fmt::Display for InterfaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.product, self.interface.letter())
    }
}

/// Where a device's bits live for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressEntry {
    pub device: HardwareDevice,
    pub role: InterfaceRole,
    pub product: String,
    pub interface: ChipInterface,
    /// Bits owned by the device within the interface byte.
    pub mask: u8,
}

impl AddressEntry {
    pub fn new(
        device: HardwareDevice,
        role: InterfaceRole,
        product: impl Into<String>,
        interface: ChipInterface,
        mask: u8,
    ) -> Self {
        Self {
            device,
            role,
            product: product.into(),
            interface,
            mask,
        }
    }

    pub fn key(&self) -> InterfaceKey {
        InterfaceKey::new(self.product.clone(), self.interface)
    }
}

/// Read-only table of [`AddressEntry`] values.
///
/// Tables built with [`AddressTable::new`] are validated: no zero masks, at
/// most one entry per (device, role), and no two entries with overlapping
/// bits on the same physical interface.
#[derive(Debug, Clone)]
pub struct AddressTable {
    entries: Vec<AddressEntry>,
}

impl AddressTable {
    /// Builds and validates a table.
    pub fn new(entries: Vec<AddressEntry>) -> Result<Self> {
        validate(&entries)?;
        debug!("Address table validated ({} entries)", entries.len());
        Ok(Self { entries })
    }

    /// The DSM3 serial board layout.
    ///
    /// Serial ports use one nibble each on the "GPIO" chip, two ports per
    /// interface: bits 2:0 transceiver config, bit 3 sensor power. The relays,
    /// buttons and LEDs share interface C of the "I2C" chip.
    pub fn dsm3() -> Self {
        let mut entries = Vec::with_capacity(24);
        for device in HardwareDevice::ports() {
            let Some(n) = device.port_number() else {
                continue;
            };
            let interface = match n / 2 {
                0 => ChipInterface::A,
                1 => ChipInterface::B,
                2 => ChipInterface::C,
                _ => ChipInterface::D,
            };
            let nibble = (n % 2) * 4;
            entries.push(AddressEntry::new(
                *device,
                InterfaceRole::PortConfig,
                consts::PRODUCT_GPIO,
                interface,
                (consts::xcvr::PORT_TYPE_BITS | consts::xcvr::TERM_BIT) << nibble,
            ));
            entries.push(AddressEntry::new(
                *device,
                InterfaceRole::PowerOutput,
                consts::PRODUCT_GPIO,
                interface,
                consts::xcvr::SENSOR_POWER_BIT << nibble,
            ));
        }

        let power_board = [
            (HardwareDevice::Dcdc, InterfaceRole::PowerOutput, 0x01),
            (HardwareDevice::Aux, InterfaceRole::PowerOutput, 0x02),
            (HardwareDevice::Bank1, InterfaceRole::PowerOutput, 0x04),
            (HardwareDevice::Bank2, InterfaceRole::PowerOutput, 0x08),
            (HardwareDevice::P1, InterfaceRole::ButtonInput, 0x10),
            (HardwareDevice::Wifi, InterfaceRole::ButtonInput, 0x20),
            (HardwareDevice::P1, InterfaceRole::PowerOutput, 0x40),
            (HardwareDevice::Wifi, InterfaceRole::PowerOutput, 0x80),
        ];
        for (device, role, mask) in power_board {
            entries.push(AddressEntry::new(
                device,
                role,
                consts::PRODUCT_I2C,
                ChipInterface::C,
                mask,
            ));
        }
        Self { entries }
    }

    /// Finds the entry for `device` in `role`. `None` means the device has no
    /// such capability, which is a normal outcome.
    pub fn lookup(&self, device: HardwareDevice, role: InterfaceRole) -> Option<&AddressEntry> {
        self.entries
            .iter()
            .find(|e| e.device == device && e.role == role)
    }

    pub fn entries(&self) -> &[AddressEntry] {
        &self.entries
    }

    /// Devices that have an entry for `role`, in table order, without duplicates.
    pub fn devices_with(&self, role: InterfaceRole) -> Vec<HardwareDevice> {
        let mut devices: Vec<HardwareDevice> = Vec::new();
        for entry in self.entries.iter().filter(|e| e.role == role) {
            if !devices.contains(&entry.device) {
                devices.push(entry.device);
            }
        }
        devices
    }
}

impl Default for AddressTable {
    fn default() -> Self {
        Self::dsm3()
    }
}

fn validate(entries: &[AddressEntry]) -> Result<()> {
    for (i, a) in entries.iter().enumerate() {
        if a.mask == 0 {
            return Err(Error::ZeroMask {
                device: a.device,
                role: a.role,
            });
        }
        for b in &entries[i + 1..] {
            if a.device == b.device && a.role == b.role {
                return Err(Error::DuplicateEntry {
                    device: a.device,
                    role: a.role,
                });
            }
            if a.product == b.product
                && a.interface == b.interface
                && (a.mask & b.mask) != 0
            {
                return Err(Error::OverlappingMask {
                    key: a.key(),
                    first: a.device,
                    first_mask: a.mask,
                    second: b.device,
                    second_mask: b.mask,
                });
            }
        }
    }
    Ok(())
}
