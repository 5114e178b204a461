//! Integration tests for the `HardwareInterface` facade.
//!
//! Everything here runs against the mock backend, so no hardware is needed.

use dsm_ftdi_gpio::{
    Backend, ButtonState, ChipInterface, HardwareConfig, HardwareDevice, HardwareInterface,
    InterfaceKey, MockBus, OutputState, PortTermination, PortType,
};
use std::sync::Arc;

fn gpio(interface: ChipInterface) -> InterfaceKey {
    InterfaceKey::new("GPIO", interface)
}

fn power_board() -> InterfaceKey {
    InterfaceKey::new("I2C", ChipInterface::C)
}

fn mock() -> (HardwareInterface, MockBus) {
    let _ = env_logger::builder().is_test(true).try_init();
    let bus = MockBus::new();
    (HardwareInterface::mock(bus.clone()), bus)
}

#[test]
fn test_capabilities_follow_address_table() {
    let (hw, _bus) = mock();

    for port in HardwareDevice::ports() {
        assert!(hw.get_output_interface(*port).is_some(), "{} power", port);
        assert!(hw.get_serial_port_interface(*port).is_some(), "{} xcvr", port);
        assert!(hw.get_button_interface(*port).is_none(), "{} button", port);
    }
    for relay in HardwareDevice::relays() {
        assert!(hw.get_output_interface(*relay).is_some());
        assert!(hw.get_serial_port_interface(*relay).is_none());
        assert!(hw.get_button_interface(*relay).is_none());
    }
    for button in HardwareDevice::buttons() {
        // LED output and switch input
        assert!(hw.get_output_interface(*button).is_some());
        assert!(hw.get_button_interface(*button).is_some());
        assert!(hw.get_serial_port_interface(*button).is_none());
    }
}

#[test]
fn test_same_adapter_is_returned() {
    let (hw, bus) = mock();

    let first = hw.get_output_interface(HardwareDevice::Port3).unwrap();
    let second = hw.get_output_interface(HardwareDevice::Port3).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let xcvr_a = hw.get_serial_port_interface(HardwareDevice::Port3).unwrap();
    let xcvr_b = hw.get_serial_port_interface(HardwareDevice::Port3).unwrap();
    assert!(Arc::ptr_eq(&xcvr_a, &xcvr_b));

    // One open per physical interface, shared by both adapters.
    assert_eq!(bus.open_count(&gpio(ChipInterface::B)), 1);
    assert_eq!(hw.registry().ref_count(&gpio(ChipInterface::B)), 2);
}

#[test]
fn test_default_state_reads_back() {
    let (hw, _bus) = mock();
    let xcvr = hw.get_serial_port_interface(HardwareDevice::Port6).unwrap();
    assert_eq!(
        xcvr.get_config(),
        Some((PortType::Loopback, PortTermination::NoTerm))
    );
    let power = hw.get_output_interface(HardwareDevice::Port6).unwrap();
    assert_eq!(power.get_state(), OutputState::Off);
    assert!(power.is_off());
}

#[test]
fn test_states_are_read_from_hardware_every_time() {
    let (hw, bus) = mock();
    let power = hw.get_output_interface(HardwareDevice::Port1).unwrap();
    assert!(power.is_off());

    // Another process switches port 1 (high nibble of GPIO/A).
    bus.set_pins(&gpio(ChipInterface::A), 0x80);
    assert!(power.is_on());

    let button = hw.get_button_interface(HardwareDevice::Wifi).unwrap();
    assert_eq!(button.get_state(), ButtonState::Up);
    bus.set_pins(&power_board(), 0x20);
    assert!(button.is_down());
    bus.set_pins(&power_board(), 0x00);
    assert!(button.is_up());
}

#[test]
fn test_read_failure_reports_unknown() {
    let (hw, bus) = mock();
    let power = hw.get_output_interface(HardwareDevice::Port0).unwrap();
    let xcvr = hw.get_serial_port_interface(HardwareDevice::Port0).unwrap();
    let button = hw.get_button_interface(HardwareDevice::P1).unwrap();

    bus.fail_reads(&gpio(ChipInterface::A), true);
    bus.fail_reads(&power_board(), true);
    assert_eq!(power.get_state(), OutputState::Unknown);
    assert!(!power.is_on());
    assert!(!power.is_off());
    assert_eq!(xcvr.get_config(), None);
    assert_eq!(button.get_state(), ButtonState::Unknown);

    bus.fail_reads(&gpio(ChipInterface::A), false);
    assert_eq!(power.get_state(), OutputState::Off);
}

#[test]
fn test_failed_write_is_dropped() {
    let (hw, bus) = mock();
    let power = hw.get_output_interface(HardwareDevice::Bank2).unwrap();

    bus.fail_writes(&power_board(), true);
    power.on();
    bus.fail_writes(&power_board(), false);
    assert_eq!(power.get_state(), OutputState::Off);

    power.on();
    assert_eq!(power.get_state(), OutputState::On);
    assert_eq!(bus.pins(&power_board()), Some(0x08));
}

#[test]
fn test_setting_unknown_changes_nothing() {
    let (hw, bus) = mock();
    let power = hw.get_output_interface(HardwareDevice::Aux).unwrap();
    power.on();
    power.set_state(OutputState::Unknown);
    assert!(power.is_on());
    assert_eq!(bus.pins(&power_board()), Some(0x02));
}

#[test]
fn test_absent_interface_is_unavailable_then_retried() {
    let (hw, bus) = mock();
    bus.set_present(&power_board(), false);

    assert!(hw.get_output_interface(HardwareDevice::Dcdc).is_none());
    assert!(hw.get_button_interface(HardwareDevice::P1).is_none());
    // Serial ports live on the other chip and are unaffected.
    assert!(hw.get_output_interface(HardwareDevice::Port0).is_some());
    assert_eq!(hw.registry().ref_count(&power_board()), 0);

    // Failures are not remembered.
    bus.set_present(&power_board(), true);
    let dcdc = hw.get_output_interface(HardwareDevice::Dcdc).unwrap();
    dcdc.on();
    assert!(dcdc.is_on());
}

#[test]
fn test_dropping_facade_closes_interfaces() {
    let (hw, bus) = mock();
    let key = gpio(ChipInterface::D);

    let _p6 = hw.get_output_interface(HardwareDevice::Port6).unwrap();
    let _p7 = hw.get_output_interface(HardwareDevice::Port7).unwrap();
    let xcvr = hw.get_serial_port_interface(HardwareDevice::Port7).unwrap();
    assert_eq!(hw.registry().ref_count(&key), 3);
    drop(_p6);
    drop(_p7);

    drop(hw);
    // The caller still holds an adapter, so the interface stays open.
    assert!(bus.is_open(&key));
    assert_eq!(bus.close_count(&key), 0);
    xcvr.set_config(PortType::Rs232, PortTermination::NoTerm);
    assert_eq!(
        xcvr.get_config(),
        Some((PortType::Rs232, PortTermination::NoTerm))
    );

    drop(xcvr);
    assert!(!bus.is_open(&key));
    assert_eq!(bus.open_count(&key), 1);
    assert_eq!(bus.close_count(&key), 1);
}

#[test]
fn test_null_backend_has_no_capabilities() {
    let hw = HardwareInterface::new(Backend::Null);
    assert_eq!(hw.path(), "null");
    for device in hw.devices() {
        assert!(hw.get_output_interface(device).is_none());
        assert!(hw.get_serial_port_interface(device).is_none());
        assert!(hw.get_button_interface(device).is_none());
    }
    assert!(hw.registry().open_interfaces().is_empty());
}

#[test]
fn test_facade_from_config() {
    let config = HardwareConfig::from_toml_str("[hardware]\ninterface = \"mock\"\n").unwrap();
    let hw = HardwareInterface::from_config(&config);
    assert_eq!(hw.path(), "mock");
    let led = hw.get_output_interface(HardwareDevice::Wifi).unwrap();
    led.on();
    assert!(led.is_on());

    let config = HardwareConfig::from_toml_str("[hardware]\ninterface = \"null\"\n").unwrap();
    let hw = HardwareInterface::from_config(&config);
    assert!(hw.get_output_interface(HardwareDevice::Wifi).is_none());
}

#[test]
fn test_device_lookup() {
    let (hw, _bus) = mock();
    assert_eq!(hw.devices().len(), 14);
    assert_eq!(hw.lookup_device("5"), Some(HardwareDevice::Port5));
    assert_eq!(hw.lookup_device("DEF"), Some(HardwareDevice::P1));
    assert_eq!(hw.lookup_device("28v"), Some(HardwareDevice::Dcdc));
    assert_eq!(hw.lookup_device("btcon"), None);
}
