//! libftdi1 binding for real FT4232H interfaces.
//!
//! Compiled against the native library only with the `libftdi` feature.
//! Without it, [`FtdiPort::open`] always fails with
//! [`Error::BackendUnavailable`] and no `FtdiPort` value can exist.

use crate::address::InterfaceKey;
use crate::error::{Error, Result};

/// USB match parameters for FT4232H chips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtdiOptions {
    pub vendor_id: u16,
    pub product_id: u16,
    /// EEPROM manufacturer string; informational, libftdi matches on the
    /// product description only.
    pub manufacturer: String,
}

impl Default for FtdiOptions {
    fn default() -> Self {
        Self {
            vendor_id: crate::consts::FTDI_VID,
            product_id: crate::consts::FT4232H_PID,
            manufacturer: crate::consts::MANUFACTURER_UCAR.to_string(),
        }
    }
}

#[cfg(feature = "libftdi")]
mod native {
    use super::*;
    use crate::address::ChipInterface;
    use crate::consts;
    use libftdi1_sys as ffi;
    use log::{debug, trace};
    use std::ffi::{CStr, CString};
    use std::os::raw::c_int;

    /// An open libftdi context bound to one interface in bit-bang mode.
    #[derive(Debug)]
    pub struct FtdiPort {
        context: *mut ffi::ftdi_context,
        key: InterfaceKey,
        direction: u8,
    }

    // The context is only ever used through `&mut self`, and callers
    // serialize access with the per-interface mutex.
    unsafe impl Send for FtdiPort {}

    impl FtdiPort {
        /// Opens the chip whose product description is `key.product`, selects
        /// `key.interface`, and enables bit-bang mode with `direction`.
        pub fn open(options: &FtdiOptions, key: &InterfaceKey, direction: u8) -> Result<Self> {
            let context = unsafe { ffi::ftdi_new() };
            if context.is_null() {
                return Err(Error::DeviceNotFound {
                    product: key.product.clone(),
                    interface: key.interface.letter(),
                    message: "ftdi_new() failed".to_string(),
                });
            }
            // From here on Drop frees the context, and closes the USB
            // device if it was opened.
            let mut port = FtdiPort {
                context,
                key: key.clone(),
                direction,
            };

            let interface = match key.interface {
                ChipInterface::A => ffi::ftdi_interface::INTERFACE_A,
                ChipInterface::B => ffi::ftdi_interface::INTERFACE_B,
                ChipInterface::C => ffi::ftdi_interface::INTERFACE_C,
                ChipInterface::D => ffi::ftdi_interface::INTERFACE_D,
            };
            let status = unsafe { ffi::ftdi_set_interface(port.context, interface) };
            if status < 0 {
                return Err(port.not_found("ftdi_set_interface", status));
            }

            let description = CString::new(key.product.as_str())
                .map_err(|e| Error::InvalidArgument(format!("product string: {}", e)))?;
            let status = unsafe {
                ffi::ftdi_usb_open_desc(
                    port.context,
                    options.vendor_id as c_int,
                    options.product_id as c_int,
                    description.as_ptr(),
                    std::ptr::null(),
                )
            };
            if status < 0 {
                return Err(port.not_found("ftdi_usb_open_desc", status));
            }
            debug!("opened: {}", port.description());

            let status =
                unsafe { ffi::ftdi_set_bitmode(port.context, direction, consts::BITMODE_BITBANG) };
            if status < 0 {
                return Err(port.not_found("ftdi_set_bitmode", status));
            }
            debug!("set bitbang mode on {}", port.description());
            Ok(port)
        }

        pub fn read_pins(&mut self) -> Result<u8> {
            let mut pins: u8 = 0;
            let status = unsafe { ffi::ftdi_read_pins(self.context, &mut pins) };
            if status < 0 {
                return Err(self.io_error("ftdi_read_pins", status));
            }
            trace!("{} read 0x{:02X}", self.description(), pins);
            Ok(pins)
        }

        pub fn write_pins(&mut self, pins: u8) -> Result<()> {
            let buf = [pins];
            let status = unsafe { ffi::ftdi_write_data(self.context, buf.as_ptr(), 1) };
            if status < 0 {
                return Err(self.io_error("ftdi_write_data", status));
            }
            trace!("{} wrote 0x{:02X}", self.description(), pins);
            Ok(())
        }

        pub fn close(self) {
            debug!("closing {}", self.description());
            // Drop does the work.
        }

        pub fn description(&self) -> String {
            format!(
                "ftdi({},{},pins={:x})",
                self.key.product,
                self.key.interface.letter(),
                self.direction
            )
        }

        fn error_string(&self) -> String {
            let msg = unsafe { ffi::ftdi_get_error_string(self.context) };
            if msg.is_null() {
                return "no error".to_string();
            }
            unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
        }

        fn not_found(&self, operation: &str, status: c_int) -> Error {
            let message = format!("{} status {}: {}", operation, status, self.error_string());
            debug!("open failed on {}: {}", self.description(), message);
            Error::DeviceNotFound {
                product: self.key.product.clone(),
                interface: self.key.interface.letter(),
                message,
            }
        }

        fn io_error(&self, operation: &'static str, status: c_int) -> Error {
            Error::Ftdi {
                operation,
                status,
                message: self.error_string(),
            }
        }
    }

    impl Drop for FtdiPort {
        fn drop(&mut self) {
            if !self.context.is_null() {
                unsafe {
                    // Harmless if the device never opened.
                    ffi::ftdi_usb_close(self.context);
                    ffi::ftdi_free(self.context);
                }
                self.context = std::ptr::null_mut();
            }
        }
    }
}

#[cfg(not(feature = "libftdi"))]
mod native {
    use super::*;
    use std::convert::Infallible;

    /// Placeholder when built without libftdi; cannot be constructed.
    #[derive(Debug)]
    pub struct FtdiPort {
        never: Infallible,
    }

    impl FtdiPort {
        pub fn open(_options: &FtdiOptions, key: &InterfaceKey, _direction: u8) -> Result<Self> {
            Err(Error::BackendUnavailable(format!(
                "cannot open {}: built without the `libftdi` feature",
                key
            )))
        }

        pub fn read_pins(&mut self) -> Result<u8> {
            match self.never {}
        }

        pub fn write_pins(&mut self, _pins: u8) -> Result<()> {
            match self.never {}
        }

        pub fn close(self) {
            match self.never {}
        }

        pub fn description(&self) -> String {
            match self.never {}
        }
    }
}

pub use native::FtdiPort;

#[cfg(all(test, not(feature = "libftdi")))]
mod tests {
    use super::*;
    use crate::address::ChipInterface;

    #[test]
    fn test_open_without_libftdi_is_unavailable() {
        let key = InterfaceKey::new("GPIO", ChipInterface::A);
        let result = FtdiPort::open(&FtdiOptions::default(), &key, 0xFF);
        assert!(matches!(result, Err(Error::BackendUnavailable(_))));
    }
}
