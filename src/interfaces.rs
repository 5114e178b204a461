//! Hardware control capabilities and their FTDI implementations.
//!
//! Each capability is a trait so higher-level code does not care how a
//! device is wired. The FTDI adapters own one [`BitfieldDevice`] each and
//! translate domain values to raw bits on every call; nothing is cached,
//! since the hardware can change underneath (buttons get pressed, other
//! processes write the chip).
//!
//! I/O failures stop here. They are logged and reported as `Unknown` states
//! (reads) or dropped (writes).

use crate::bitfield::BitfieldDevice;
use crate::consts::xcvr;
use crate::error::{Error, Result};
use log::{debug, warn};
use std::fmt;
use std::str::FromStr;

/// State of a power output, relay or LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputState {
    #[default]
    Unknown,
    Off,
    On,
}

impl fmt::Display for OutputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputState::Unknown => "unknown",
            OutputState::Off => "off",
            OutputState::On => "on",
        })
    }
}

impl FromStr for OutputState {
    type Err = Error;

    /// Accepts "on"/"off" in any case, plus the `pio` spellings "1", "0",
    /// "power_on" and "power_off".
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" | "1" | "power_on" => Ok(OutputState::On),
            "off" | "0" | "power_off" => Ok(OutputState::Off),
            _ => Err(Error::InvalidArgument(format!("output state '{}'", s))),
        }
    }
}

/// State of a push button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonState {
    #[default]
    Unknown,
    Up,
    Down,
}

impl fmt::Display for ButtonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ButtonState::Unknown => "unknown",
            ButtonState::Up => "up",
            ButtonState::Down => "down",
        })
    }
}

/// Serial transceiver mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortType {
    Loopback,
    Rs232,
    Rs422,
    /// Full duplex RS485 uses the RS422 transceiver setting and reads back as `Rs422`.
    Rs485Full,
    Rs485Half,
}

impl PortType {
    /// Transceiver mode code written to bits 1:0.
    pub fn code(&self) -> u8 {
        match self {
            PortType::Loopback => xcvr::LOOPBACK_BITS,
            PortType::Rs232 => xcvr::RS232_BITS,
            PortType::Rs422 | PortType::Rs485Full => xcvr::RS422_RS485_BITS,
            PortType::Rs485Half => xcvr::RS485_HALF_BITS,
        }
    }

    /// Decodes bits 1:0. Anything unrecognized is loopback.
    pub fn from_code(bits: u8) -> Self {
        match bits & xcvr::PORT_TYPE_BITS {
            xcvr::RS422_RS485_BITS => PortType::Rs422,
            xcvr::RS485_HALF_BITS => PortType::Rs485Half,
            xcvr::RS232_BITS => PortType::Rs232,
            _ => PortType::Loopback,
        }
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PortType::Loopback => "LOOPBACK",
            PortType::Rs232 => "RS232",
            PortType::Rs422 => "RS422",
            PortType::Rs485Full => "RS485_FULL",
            PortType::Rs485Half => "RS485_HALF",
        })
    }
}

impl FromStr for PortType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOOPBACK" => Ok(PortType::Loopback),
            "RS232" => Ok(PortType::Rs232),
            "RS422" => Ok(PortType::Rs422),
            "RS485_FULL" => Ok(PortType::Rs485Full),
            "RS485_HALF" => Ok(PortType::Rs485Half),
            _ => Err(Error::InvalidArgument(format!("port type '{}'", s))),
        }
    }
}

/// Serial line termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PortTermination {
    #[default]
    NoTerm,
    Term120Ohm,
}

impl fmt::Display for PortTermination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PortTermination::NoTerm => "NO_TERM",
            PortTermination::Term120Ohm => "TERM_120_OHM",
        })
    }
}

impl FromStr for PortTermination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NO_TERM" => Ok(PortTermination::NoTerm),
            "TERM_120_OHM" => Ok(PortTermination::Term120Ohm),
            _ => Err(Error::InvalidArgument(format!("termination '{}'", s))),
        }
    }
}

/// Packs a transceiver configuration into the device-local bit pattern.
pub fn xcvr_bits(port_type: PortType, term: PortTermination) -> u8 {
    let mut bits = port_type.code();
    if term == PortTermination::Term120Ohm {
        bits |= xcvr::TERM_BIT;
    }
    bits
}

/// Unpacks the device-local bit pattern of a transceiver.
pub fn xcvr_config(bits: u8) -> (PortType, PortTermination) {
    let term = if bits & xcvr::TERM_BIT != 0 {
        PortTermination::Term120Ohm
    } else {
        PortTermination::NoTerm
    };
    (PortType::from_code(bits), term)
}

/// Something that can be switched on and off: sensor power, a relay, an LED.
pub trait OutputInterface: Send + Sync + fmt::Debug {
    /// Current state; `Unknown` if the hardware could not be read.
    fn get_state(&self) -> OutputState;

    /// Switches the output. `Unknown` is ignored.
    fn set_state(&self, state: OutputState);

    fn on(&self) {
        self.set_state(OutputState::On);
    }

    fn off(&self) {
        self.set_state(OutputState::Off);
    }

    fn is_on(&self) -> bool {
        self.get_state() == OutputState::On
    }

    fn is_off(&self) -> bool {
        self.get_state() == OutputState::Off
    }
}

/// Transceiver configuration of a serial port.
pub trait SerialPortInterface: Send + Sync + fmt::Debug {
    /// Current mode and termination, or `None` if the hardware could not be read.
    fn get_config(&self) -> Option<(PortType, PortTermination)>;

    fn set_config(&self, port_type: PortType, term: PortTermination);
}

/// A push button.
pub trait ButtonInterface: Send + Sync + fmt::Debug {
    fn get_state(&self) -> ButtonState;

    fn is_up(&self) -> bool {
        self.get_state() == ButtonState::Up
    }

    fn is_down(&self) -> bool {
        self.get_state() == ButtonState::Down
    }
}

/// Output backed by FTDI GPIO bits.
#[derive(Debug)]
pub struct FtdiOutput {
    bits: BitfieldDevice,
}

impl FtdiOutput {
    pub fn new(bits: BitfieldDevice) -> Self {
        debug!(
            "Output interface for {} on {} mask 0x{:02X}",
            bits.device(),
            bits.key(),
            bits.mask()
        );
        Self { bits }
    }
}

impl OutputInterface for FtdiOutput {
    fn get_state(&self) -> OutputState {
        match self.bits.read_bits() {
            Ok(0) => OutputState::Off,
            Ok(_) => OutputState::On,
            Err(e) => {
                warn!("{}: cannot read output state: {}", self.bits.device(), e);
                OutputState::Unknown
            }
        }
    }

    fn set_state(&self, state: OutputState) {
        let value = match state {
            OutputState::On => 1,
            OutputState::Off => 0,
            OutputState::Unknown => {
                debug!("{}: ignoring request to set unknown state", self.bits.device());
                return;
            }
        };
        if let Err(e) = self.bits.write_bits(value) {
            warn!("{}: cannot switch output {}: {}", self.bits.device(), state, e);
        }
    }
}

/// Serial transceiver control backed by FTDI GPIO bits.
#[derive(Debug)]
pub struct FtdiSerialPort {
    bits: BitfieldDevice,
}

impl FtdiSerialPort {
    pub fn new(bits: BitfieldDevice) -> Self {
        debug!(
            "Serial port interface for {} on {} mask 0x{:02X}",
            bits.device(),
            bits.key(),
            bits.mask()
        );
        Self { bits }
    }
}

impl SerialPortInterface for FtdiSerialPort {
    fn get_config(&self) -> Option<(PortType, PortTermination)> {
        match self.bits.read_bits() {
            Ok(bits) => Some(xcvr_config(bits)),
            Err(e) => {
                warn!("{}: cannot read transceiver config: {}", self.bits.device(), e);
                None
            }
        }
    }

    fn set_config(&self, port_type: PortType, term: PortTermination) {
        let desired = xcvr_bits(port_type, term);
        debug!(
            "{}: applying {} | {} (0x{:02X})",
            self.bits.device(),
            port_type,
            term,
            desired
        );
        if let Err(e) = self.bits.write_bits(desired) {
            warn!("{}: cannot write transceiver config: {}", self.bits.device(), e);
            return;
        }
        match self.bits.read_bits() {
            Ok(actual) if actual == desired => {}
            Ok(actual) => warn!(
                "{}: transceiver bits read back 0x{:02X}, wrote 0x{:02X}",
                self.bits.device(),
                actual,
                desired
            ),
            Err(e) => warn!("{}: cannot verify transceiver config: {}", self.bits.device(), e),
        }
    }
}

/// Button backed by FTDI GPIO input bits.
#[derive(Debug)]
pub struct FtdiButton {
    bits: BitfieldDevice,
}

impl FtdiButton {
    pub fn new(bits: BitfieldDevice) -> Self {
        debug!(
            "Button interface for {} on {} mask 0x{:02X}",
            bits.device(),
            bits.key(),
            bits.mask()
        );
        Self { bits }
    }
}

impl ButtonInterface for FtdiButton {
    fn get_state(&self) -> ButtonState {
        match self.bits.read_bits() {
            Ok(0) => ButtonState::Up,
            Ok(_) => ButtonState::Down,
            Err(e) => {
                warn!("{}: cannot read button: {}", self.bits.device(), e);
                ButtonState::Unknown
            }
        }
    }
}
