//! The DSM hardware device namespace.
//!
//! A `HardwareDevice` names a real component on a DSM (a serial port, a power
//! relay, a button/LED pair). The same device can expose more than one kind of
//! hardware control: a serial port has both transceiver configuration and
//! sensor power, a button has both a switch input and an LED output.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Identifies one controllable component of a DSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HardwareDevice {
    Port0,
    Port1,
    Port2,
    Port3,
    Port4,
    Port5,
    Port6,
    Port7,
    Dcdc,
    Bank1,
    Bank2,
    Aux,
    P1,
    Wifi,
}

/// The default switch is the P1 button.
pub const DEF: HardwareDevice = HardwareDevice::P1;

const PORTS: [HardwareDevice; 8] = [
    HardwareDevice::Port0,
    HardwareDevice::Port1,
    HardwareDevice::Port2,
    HardwareDevice::Port3,
    HardwareDevice::Port4,
    HardwareDevice::Port5,
    HardwareDevice::Port6,
    HardwareDevice::Port7,
];

const RELAYS: [HardwareDevice; 4] = [
    HardwareDevice::Dcdc,
    HardwareDevice::Bank1,
    HardwareDevice::Bank2,
    HardwareDevice::Aux,
];

const BUTTONS: [HardwareDevice; 2] = [HardwareDevice::P1, HardwareDevice::Wifi];

impl HardwareDevice {
    /// Short lower-case identifier, as used on command lines and in configuration.
    pub fn id(&self) -> &'static str {
        match self {
            HardwareDevice::Port0 => "port0",
            HardwareDevice::Port1 => "port1",
            HardwareDevice::Port2 => "port2",
            HardwareDevice::Port3 => "port3",
            HardwareDevice::Port4 => "port4",
            HardwareDevice::Port5 => "port5",
            HardwareDevice::Port6 => "port6",
            HardwareDevice::Port7 => "port7",
            HardwareDevice::Dcdc => "dcdc",
            HardwareDevice::Bank1 => "bank1",
            HardwareDevice::Bank2 => "bank2",
            HardwareDevice::Aux => "aux",
            HardwareDevice::P1 => "p1",
            HardwareDevice::Wifi => "wifi",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            HardwareDevice::Port0 => "Sensor power on DSM serial port 0",
            HardwareDevice::Port1 => "Sensor power on DSM serial port 1",
            HardwareDevice::Port2 => "Sensor power on DSM serial port 2",
            HardwareDevice::Port3 => "Sensor power on DSM serial port 3",
            HardwareDevice::Port4 => "Sensor power on DSM serial port 4",
            HardwareDevice::Port5 => "Sensor power on DSM serial port 5",
            HardwareDevice::Port6 => "Sensor power on DSM serial port 6",
            HardwareDevice::Port7 => "Sensor power on DSM serial port 7",
            HardwareDevice::Dcdc => "DC-DC converter relay",
            HardwareDevice::Bank1 => {
                "Bank1 12V to serial card and IO panel, not connected on DSM3"
            }
            HardwareDevice::Bank2 => "Bank2 12V socket, for accessories.",
            HardwareDevice::Aux => "Auxiliary 12V power, typically chained to other DSMs",
            HardwareDevice::P1 => "p1 button and LED, also known as default switch.",
            HardwareDevice::Wifi => "wifi button and LED.",
        }
    }

    /// Serial port number 0-7, or `None` for relays and buttons.
    pub fn port_number(&self) -> Option<u8> {
        PORTS.iter().position(|p| p == self).map(|i| i as u8)
    }

    /// The serial port device for a port number 0-7.
    pub fn port(number: u8) -> Option<HardwareDevice> {
        PORTS.get(number as usize).copied()
    }

    /// Serial ports, which have transceiver and sensor power controls.
    pub fn ports() -> &'static [HardwareDevice] {
        &PORTS
    }

    /// Power relays, which only have output controls.
    pub fn relays() -> &'static [HardwareDevice] {
        &RELAYS
    }

    /// Button/LED pairs, which have both button inputs and LED outputs.
    pub fn buttons() -> &'static [HardwareDevice] {
        &BUTTONS
    }

    /// Every known device: ports, then relays, then buttons.
    pub fn devices() -> Vec<HardwareDevice> {
        PORTS
            .iter()
            .chain(RELAYS.iter())
            .chain(BUTTONS.iter())
            .copied()
            .collect()
    }
}

/// Finds a device by its identifier.
///
/// Matching is case-insensitive. A single digit `0`-`7` is shorthand for the
/// serial port with that number, `28v` is the DC-DC relay and `def` is the
/// default switch (P1).
pub fn lookup_device(id: &str) -> Option<HardwareDevice> {
    lookup_device_in(id, &HardwareDevice::devices())
}

/// Like [`lookup_device`], but only searches `devices`.
pub fn lookup_device_in(id: &str, devices: &[HardwareDevice]) -> Option<HardwareDevice> {
    let mut lower = id.trim().to_ascii_lowercase();
    if lower.len() == 1 && matches!(lower.as_bytes()[0], b'0'..=b'7') {
        lower = format!("port{}", lower);
    }
    let alias = match lower.as_str() {
        "def" => Some(DEF.id()),
        "28v" => Some(HardwareDevice::Dcdc.id()),
        _ => None,
    };
    if let Some(alias) = alias {
        lower = alias.to_string();
    }
    devices.iter().copied().find(|d| d.id() == lower)
}

impl fmt::Display for HardwareDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for HardwareDevice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        lookup_device(s).ok_or_else(|| Error::UnknownDevice(s.to_string()))
    }
}
