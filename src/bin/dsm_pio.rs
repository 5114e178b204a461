//! dsm_pio: show and control DSM power outputs and serial transceivers.
//!
//! # Usage
//!
//! ```bash
//! # List the controllable devices
//! dsm_pio --map
//!
//! # Show the power state of every device
//! dsm_pio --view
//!
//! # Show, then switch, sensor power on serial port 3
//! dsm_pio -d 3
//! dsm_pio -d 3 -p on
//!
//! # Put port 5 into RS422 mode with termination
//! dsm_pio -d port5 --xcvr RS422 --term
//!
//! # Try things out without hardware
//! dsm_pio --interface mock -d aux -p on -l debug
//! ```

use clap::{Parser, ValueEnum};
use dsm_ftdi_gpio::{
    Error, HardwareConfig, HardwareDevice, HardwareInterface, InterfaceKind, OutputState,
    PortTermination, PortType, Result,
};
use log::debug;
use std::path::PathBuf;
use std::process;

/// Show and control power and transceiver settings of DSM devices
#[derive(Parser, Debug)]
#[command(name = "dsm_pio")]
#[command(version)]
#[command(about = "Show and control DSM power and serial transceiver settings", long_about = None)]
struct Args {
    /// Device to show or control: 0-7, port0-port7, 28V, dcdc, aux, bank1,
    /// bank2, p1, wifi or def
    #[arg(short = 'd', long = "device-id", value_name = "DEVICE")]
    device: Option<String>,

    /// New power state: on|off|1|0|power_on|power_off
    #[arg(short, long, value_name = "STATE")]
    power: Option<String>,

    /// List the devices that can be controlled and exit
    #[arg(short, long)]
    map: bool,

    /// Show the current power settings of all devices and exit
    #[arg(short, long)]
    view: bool,

    /// New transceiver mode of a serial port: LOOPBACK, RS232, RS422,
    /// RS485_FULL or RS485_HALF
    #[arg(long, value_name = "TYPE")]
    xcvr: Option<String>,

    /// Enable the 120 ohm termination when setting the transceiver mode
    #[arg(long, requires = "xcvr")]
    term: bool,

    /// How to reach the hardware; overrides the configuration file
    #[arg(long, value_enum)]
    interface: Option<InterfaceArg>,

    /// TOML configuration file with a [hardware] table
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter, e.g. "warn", "debug" or "dsm_ftdi_gpio=trace"
    #[arg(short = 'l', long = "log-level", default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InterfaceArg {
    /// FT4232H chips through libftdi
    Ftdi,
    /// In-memory registers
    Mock,
    /// No hardware at all
    Null,
}

impl From<InterfaceArg> for InterfaceKind {
    fn from(arg: InterfaceArg) -> Self {
        match arg {
            InterfaceArg::Ftdi => InterfaceKind::Ftdi,
            InterfaceArg::Mock => InterfaceKind::Mock,
            InterfaceArg::Null => InterfaceKind::Null,
        }
    }
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::new()
        .parse_filters(&args.log_level)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("dsm_pio: {}", e);
        process::exit(match e {
            Error::UnknownDevice(_) | Error::InvalidArgument(_) => 2,
            _ => 1,
        });
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => HardwareConfig::from_file(path)?,
        None => HardwareConfig::default(),
    };
    if let Some(interface) = args.interface {
        config = config.with_interface(interface.into());
    }
    debug!("Using {} interface", config.interface);
    let hw = HardwareInterface::from_config(&config);

    if args.map {
        print_map(&hw);
        return Ok(());
    }
    if args.view {
        print_all(&hw);
        return Ok(());
    }

    let Some(id) = &args.device else {
        return Err(Error::InvalidArgument(
            "a device id (-d) is required unless --map or --view is given".to_string(),
        ));
    };
    let device = hw
        .lookup_device(id)
        .ok_or_else(|| Error::UnknownDevice(id.clone()))?;

    if let Some(xcvr) = &args.xcvr {
        let port_type: PortType = xcvr.parse()?;
        let term = if args.term {
            PortTermination::Term120Ohm
        } else {
            PortTermination::NoTerm
        };
        set_transceiver(&hw, device, port_type, term)?;
    }

    match &args.power {
        Some(power) => {
            let state: OutputState = power.parse()?;
            set_power(&hw, device, state)
        }
        None if args.xcvr.is_none() => {
            println!();
            println!("Current Device State");
            println!("====================");
            print_device(&hw, device);
            Ok(())
        }
        None => Ok(()),
    }
}

fn print_map(hw: &HardwareInterface) {
    println!("Device   Description");
    println!("------   -----------");
    for device in hw.devices() {
        println!("{:<8} {}", device.id(), device.description());
    }
}

fn print_all(hw: &HardwareInterface) {
    println!("Current Power Settings");
    println!("----------------------");
    println!("Device   Setting");
    for device in hw.devices() {
        print_device(hw, device);
    }
}

fn print_device(hw: &HardwareInterface, device: HardwareDevice) {
    let power = hw
        .get_output_interface(device)
        .map_or_else(|| "n/a".to_string(), |o| o.get_state().to_string());
    let mut line = format!("{:<8} {:<8}", device.id(), power);
    if let Some(xcvr) = hw.get_serial_port_interface(device) {
        match xcvr.get_config() {
            Some((port_type, term)) => line.push_str(&format!(" {} {}", port_type, term)),
            None => line.push_str(" unknown"),
        }
    }
    if let Some(button) = hw.get_button_interface(device) {
        line.push_str(&format!(" button {}", button.get_state()));
    }
    println!("{}", line.trim_end());
}

fn set_power(hw: &HardwareInterface, device: HardwareDevice, state: OutputState) -> Result<()> {
    let output = hw.get_output_interface(device).ok_or_else(|| {
        Error::BackendUnavailable(format!("no power control for {} on {}", device, hw.path()))
    })?;
    println!();
    println!("Current Device Power State");
    println!("==========================");
    println!("{:<8} {}", device.id(), output.get_state());

    output.set_state(state);

    println!();
    println!("New Power State");
    println!("===============");
    println!("{:<8} {}", device.id(), output.get_state());
    Ok(())
}

fn set_transceiver(
    hw: &HardwareInterface,
    device: HardwareDevice,
    port_type: PortType,
    term: PortTermination,
) -> Result<()> {
    let xcvr = hw.get_serial_port_interface(device).ok_or_else(|| {
        Error::BackendUnavailable(format!(
            "no transceiver control for {} on {}",
            device,
            hw.path()
        ))
    })?;
    let show = |label: &str| match xcvr.get_config() {
        Some((pt, t)) => println!("{:<8} {:<8} {} {}", device.id(), label, pt, t),
        None => println!("{:<8} {:<8} unknown", device.id(), label),
    };
    show("current");
    xcvr.set_config(port_type, term);
    show("new");
    Ok(())
}
