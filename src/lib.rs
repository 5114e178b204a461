//! # dsm-ftdi-gpio
//!
//! Control of the DSM serial board through the bit-bang GPIO interfaces of
//! its FTDI FT4232H chips: serial transceiver mode and termination, sensor
//! power, power relays, and the front-panel buttons and LEDs.
//!
//! Several devices share each 8-bit interface. The crate opens every
//! physical interface once, shares it by reference count, and does all
//! writes as read-modify-write under the interface's lock, so a device
//! never disturbs bits owned by another.
//!
//! ## Features
//!
//! *   A device namespace (`HardwareDevice`) with lookup by id (`"port3"`,
//!     `"dcdc"`, `"p1"`, `"def"`, or a single port digit).
//! *   A static address table (`AddressTable::dsm3`) mapping each device and
//!     role to a chip, an interface and a bit mask.
//! *   Capability traits:
//!     *   `OutputInterface`: power switches, relays and LEDs.
//!     *   `SerialPortInterface`: transceiver mode and 120 ohm termination.
//!     *   `ButtonInterface`: push buttons.
//! *   A `HardwareInterface` facade that builds and caches one adapter per
//!     device and capability.
//! *   Three backends: libftdi1 (feature `libftdi`), an in-memory mock, and
//!     a null backend with no devices.
//! *   TOML configuration (`HardwareConfig`) and the `dsm_pio` command line tool.
//!
//! ## Basic Usage
//!
//! ```
//! use dsm_ftdi_gpio::{
//!     HardwareDevice, HardwareInterface, MockBus, OutputState, PortTermination, PortType,
//! };
//!
//! let hw = HardwareInterface::mock(MockBus::new());
//!
//! if let Some(power) = hw.get_output_interface(HardwareDevice::Port2) {
//!     power.on();
//!     assert_eq!(power.get_state(), OutputState::On);
//! }
//!
//! if let Some(xcvr) = hw.get_serial_port_interface(HardwareDevice::Port2) {
//!     xcvr.set_config(PortType::Rs422, PortTermination::Term120Ohm);
//!     assert_eq!(
//!         xcvr.get_config(),
//!         Some((PortType::Rs422, PortTermination::Term120Ohm))
//!     );
//! }
//!
//! // Port 2 has no button.
//! assert!(hw.get_button_interface(HardwareDevice::Port2).is_none());
//! ```
//!
//! Capability getters return `None` when a device lacks the capability or
//! its interface cannot be opened. Reads that fail afterwards report
//! `Unknown` (or `None` for a transceiver configuration) and log a warning.
//!
//! ## Hardware Setup Notes
//!
//! *   The chips are matched by EEPROM product string: `"GPIO"` carries the
//!     serial port transceivers and sensor power, `"I2C"` carries relays,
//!     buttons and LEDs on interface C.
//! *   **Linux udev Rules:** Grant user permission to the FTDI device, e.g. in
//!     `/etc/udev/rules.d/99-dsm-ftdi.rules`:
//!     ```udev
//!     SUBSYSTEM=="usb", ATTRS{idVendor}=="0403", ATTRS{idProduct}=="6011", MODE="0666", GROUP="plugdev"
//!     ```
//!     Opening an interface in bit-bang mode detaches the kernel `ftdi_sio`
//!     driver from it.
//!
//! ## Bit Mapping
//!
//! *   Port `n` is on chip `"GPIO"`, interface A to D for `n / 2`. Even ports
//!     use the low nibble, odd ports the high nibble: bits 0-1 transceiver
//!     mode, bit 2 termination, bit 3 sensor power.
//! *   Chip `"I2C"` interface C: bit 0 DC-DC 28V, bit 1 aux, bit 2 bank 1,
//!     bit 3 bank 2, bit 4 P1 button, bit 5 WIFI button, bit 6 P1 LED,
//!     bit 7 WIFI LED.

pub mod address;
pub mod backend;
pub mod bitfield;
pub mod config;
mod consts;
pub mod device;
mod error;
pub mod ftdi;
pub mod hardware;
pub mod interfaces;
pub mod mock;
pub mod registry;

pub use address::{AddressEntry, AddressTable, ChipInterface, InterfaceKey, InterfaceRole};
pub use backend::Backend;
pub use config::{HardwareConfig, InterfaceKind};
pub use consts::{FT4232H_PID, FTDI_VID, MANUFACTURER_UCAR, PRODUCT_GPIO, PRODUCT_I2C};
pub use device::{lookup_device, HardwareDevice};
pub use error::{Error, Result};
pub use ftdi::FtdiOptions;
pub use hardware::HardwareInterface;
pub use interfaces::{
    ButtonInterface, ButtonState, OutputInterface, OutputState, PortTermination, PortType,
    SerialPortInterface,
};
pub use mock::MockBus;
pub use registry::SharedInterfaceRegistry;
