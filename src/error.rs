use crate::address::{InterfaceKey, InterfaceRole};
use crate::device::HardwareDevice;
use thiserror::Error;

/// Errors that can occur while mapping DSM devices onto FTDI GPIO interfaces.
///
/// Most of these never reach users of the capability adapters: transient I/O
/// failures are logged and turned into `UNKNOWN` states there. They are
/// returned as-is by the lower layers (`SharedInterfaceRegistry`,
/// `BitfieldDevice`, `AddressTable`, `HardwareConfig`).
#[derive(Error, Debug)]
pub enum Error {
    /// The physical interface could not be opened (chip absent, USB claim failure).
    #[error("FTDI interface {product}/{interface} not found: {message}")]
    DeviceNotFound {
        /// EEPROM product string that was searched for.
        product: String,
        /// Interface letter (A-D).
        interface: char,
        /// Additional error details from the driver.
        message: String,
    },
    /// A libftdi call failed on an interface that is open.
    #[error("FTDI {operation} failed with status {status}: {message}")]
    Ftdi {
        /// The libftdi operation that failed.
        operation: &'static str,
        /// The negative status code returned by libftdi.
        status: i32,
        /// libftdi's error string for the context.
        message: String,
    },
    /// I/O was attempted on an interface whose last lease was already released.
    #[error("Interface {key} is closed")]
    InterfaceClosed {
        /// The interface that was accessed.
        key: InterfaceKey,
    },
    /// The configured backend cannot open interfaces.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
    /// An address entry selects no bits.
    #[error("Address entry for {device} ({role}) has an empty mask")]
    ZeroMask {
        /// Device of the offending entry.
        device: HardwareDevice,
        /// Role of the offending entry.
        role: InterfaceRole,
    },
    /// The same (device, role) pair appears twice in an address table.
    #[error("Duplicate address entry for {device} ({role})")]
    DuplicateEntry {
        /// Device of the duplicated entry.
        device: HardwareDevice,
        /// Role of the duplicated entry.
        role: InterfaceRole,
    },
    /// Two address entries claim the same bits of one physical interface.
    #[error(
        "Masks overlap on {key}: {first} (0x{first_mask:02X}) and {second} (0x{second_mask:02X})"
    )]
    OverlappingMask {
        /// The shared physical interface.
        key: InterfaceKey,
        /// First device.
        first: HardwareDevice,
        /// Mask of the first device.
        first_mask: u8,
        /// Second device.
        second: HardwareDevice,
        /// Mask of the second device.
        second_mask: u8,
    },
    /// A device identifier did not name any known DSM device.
    #[error("Unknown hardware device '{0}'")]
    UnknownDevice(String),
    /// A textual argument could not be parsed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),
    /// General I/O error, e.g. while reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Failure injected into a mock interface.
    #[error("Injected failure: {0}")]
    Injected(String),
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
