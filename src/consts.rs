//! Internal constants: USB identifiers, EEPROM strings and bit definitions.

// Default Vendor/Product IDs
/// FTDI vendor ID.
pub const FTDI_VID: u16 = 0x0403;
/// Product ID of the FT4232H quad high-speed USB to multipurpose UART/MPSSE IC.
pub const FT4232H_PID: u16 = 0x6011;

// EEPROM strings programmed on the DSM3 serial boards.
/// Manufacturer string written into every DSM3 FTDI EEPROM.
pub const MANUFACTURER_UCAR: &str = "UCAR";
/// Product string of the FT4232H that drives the serial transceivers and port power.
pub const PRODUCT_GPIO: &str = "GPIO";
/// Product string of the FT4232H that drives the relays, buttons and LEDs.
pub const PRODUCT_I2C: &str = "I2C";

// libftdi bitmode values (enum ftdi_mpsse_mode)
#[cfg_attr(not(feature = "libftdi"), allow(dead_code))]
pub const BITMODE_BITBANG: u8 = 0x01;

// --- Serial transceiver nibble (device local, right justified) ---
pub mod xcvr {
    /// Bits 1:0 select the transceiver mode.
    pub const PORT_TYPE_BITS: u8 = 0b0000_0011;
    /// Bit 2 enables the 120 ohm termination resistor.
    pub const TERM_BIT: u8 = 0b0000_0100;
    /// Bit 3 of each port nibble switches sensor power.
    pub const SENSOR_POWER_BIT: u8 = 0b0000_1000;

    // Mode codes
    pub const LOOPBACK_BITS: u8 = 0;
    pub const RS232_BITS: u8 = 1;
    pub const RS485_HALF_BITS: u8 = 2;
    pub const RS422_RS485_BITS: u8 = 3;
}

// --- Pin direction masks for bit-bang mode (1 = output) ---
pub mod pins {
    /// Default: every pin is an output.
    pub const ALL_OUTPUTS: u8 = 0xFF;
    /// I2C chip interface C: power board control on bits 0-3, switch inputs on
    /// bits 4-5, LED outputs on bits 6-7.
    pub const I2C_IFACE_C: u8 = 0xCF;
}
