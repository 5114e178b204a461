//! Selection of the low-level GPIO implementation.
//!
//! The backend is resolved once when an interface is acquired: the result is
//! a `PortHandle` that is either a real libftdi context or a mock register.

use crate::address::InterfaceKey;
use crate::error::{Error, Result};
use crate::ftdi::{FtdiOptions, FtdiPort};
use crate::mock::{MockBus, MockPort};

/// How physical interfaces get opened.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Real FT4232H chips through libftdi.
    Ftdi(FtdiOptions),
    /// Shadow registers in memory.
    Mock(MockBus),
    /// Nothing is present; every open fails.
    Null,
}

impl Backend {
    /// Opens `key` and puts it into bit-bang mode with `direction`.
    pub fn open(&self, key: &InterfaceKey, direction: u8) -> Result<PortHandle> {
        match self {
            Backend::Ftdi(options) => FtdiPort::open(options, key, direction).map(PortHandle::Ftdi),
            Backend::Mock(bus) => bus.open(key, direction).map(PortHandle::Mock),
            Backend::Null => Err(Error::BackendUnavailable(format!(
                "null interface cannot open {}",
                key
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Ftdi(_) => "ftdi",
            Backend::Mock(_) => "mock",
            Backend::Null => "null",
        }
    }
}

/// An opened physical interface.
#[derive(Debug)]
pub enum PortHandle {
    Ftdi(FtdiPort),
    Mock(MockPort),
}

impl PortHandle {
    pub fn read_pins(&mut self) -> Result<u8> {
        match self {
            PortHandle::Ftdi(port) => port.read_pins(),
            PortHandle::Mock(port) => port.read_pins(),
        }
    }

    pub fn write_pins(&mut self, pins: u8) -> Result<()> {
        match self {
            PortHandle::Ftdi(port) => port.write_pins(pins),
            PortHandle::Mock(port) => port.write_pins(pins),
        }
    }

    pub fn close(self) {
        match self {
            PortHandle::Ftdi(port) => port.close(),
            PortHandle::Mock(port) => port.close(),
        }
    }

    pub fn description(&self) -> String {
        match self {
            PortHandle::Ftdi(port) => port.description(),
            PortHandle::Mock(port) => format!("mock({})", port.key()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ChipInterface;

    #[test]
    fn test_null_backend_opens_nothing() {
        let key = InterfaceKey::new("GPIO", ChipInterface::A);
        assert!(matches!(
            Backend::Null.open(&key, 0xFF),
            Err(Error::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_mock_handle_dispatch() {
        let bus = MockBus::new();
        let key = InterfaceKey::new("I2C", ChipInterface::C);
        let mut handle = Backend::Mock(bus.clone()).open(&key, 0xCF).unwrap();
        assert_eq!(handle.description(), "mock(I2C/C)");
        handle.write_pins(0x41).unwrap();
        assert_eq!(handle.read_pins().unwrap(), 0x41);
        handle.close();
        assert_eq!(bus.close_count(&key), 1);
    }
}
