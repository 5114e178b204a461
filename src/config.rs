//! Hardware interface configuration.
//!
//! ```toml
//! [hardware]
//! interface = "ftdi"     # "ftdi" | "mock" | "null"
//! manufacturer = "UCAR"
//! vendor_id = 0x0403
//! product_id = 0x6011
//! ```
//!
//! Every key is optional and defaults to the DSM3 values.

use crate::backend::Backend;
use crate::consts;
use crate::error::Result;
use crate::ftdi::FtdiOptions;
use crate::mock::MockBus;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Which backend the hardware interface uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    #[default]
    Ftdi,
    Mock,
    Null,
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InterfaceKind::Ftdi => "ftdi",
            InterfaceKind::Mock => "mock",
            InterfaceKind::Null => "null",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HardwareConfig {
    pub interface: InterfaceKind,
    pub manufacturer: String,
    pub vendor_id: u16,
    pub product_id: u16,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            interface: InterfaceKind::default(),
            manufacturer: consts::MANUFACTURER_UCAR.to_string(),
            vendor_id: consts::FTDI_VID,
            product_id: consts::FT4232H_PID,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    hardware: HardwareConfig,
}

impl HardwareConfig {
    /// Parses the `[hardware]` table of a TOML document. A document without
    /// one yields the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text)?;
        Ok(file.hardware)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Same configuration with a different interface kind.
    pub fn with_interface(mut self, interface: InterfaceKind) -> Self {
        self.interface = interface;
        self
    }

    /// Builds the backend described by this configuration. A mock
    /// configuration gets a fresh, empty bus.
    pub fn backend(&self) -> Backend {
        match self.interface {
            InterfaceKind::Ftdi => Backend::Ftdi(FtdiOptions {
                vendor_id: self.vendor_id,
                product_id: self.product_id,
                manufacturer: self.manufacturer.clone(),
            }),
            InterfaceKind::Mock => Backend::Mock(MockBus::new()),
            InterfaceKind::Null => Backend::Null,
        }
    }
}
