//! Integration tests for devices sharing one physical GPIO byte.

use dsm_ftdi_gpio::{
    AddressEntry, AddressTable, Backend, ButtonState, ChipInterface, Error, HardwareDevice,
    HardwareInterface, InterfaceKey, InterfaceRole, MockBus, OutputState, PortTermination, PortType,
};
use std::sync::Arc;
use std::thread;

fn gpio(interface: ChipInterface) -> InterfaceKey {
    InterfaceKey::new("GPIO", interface)
}

#[test]
fn test_transceiver_write_preserves_other_bits() {
    let bus = MockBus::new();
    let key = gpio(ChipInterface::A);
    bus.set_pins(&key, 0b1010_1000);
    let hw = HardwareInterface::mock(bus.clone());

    let xcvr = hw.get_serial_port_interface(HardwareDevice::Port0).unwrap();
    xcvr.set_config(PortType::Rs422, PortTermination::Term120Ohm);

    assert_eq!(bus.pins(&key), Some(0b1010_1111));
    assert_eq!(
        xcvr.get_config(),
        Some((PortType::Rs422, PortTermination::Term120Ohm))
    );
    // Sensor power of port 0 and the whole of port 1 are untouched.
    assert!(hw.get_output_interface(HardwareDevice::Port0).unwrap().is_on());
    assert_eq!(
        hw.get_serial_port_interface(HardwareDevice::Port1)
            .unwrap()
            .get_config(),
        Some((PortType::Rs485Half, PortTermination::NoTerm))
    );
}

#[test]
fn test_rs485_full_reads_back_as_rs422() {
    let hw = HardwareInterface::mock(MockBus::new());
    let xcvr = hw.get_serial_port_interface(HardwareDevice::Port4).unwrap();
    xcvr.set_config(PortType::Rs485Full, PortTermination::NoTerm);
    assert_eq!(
        xcvr.get_config(),
        Some((PortType::Rs422, PortTermination::NoTerm))
    );
}

#[test]
fn test_neighbouring_ports_are_order_independent() {
    let run = |odd_first: bool| {
        let bus = MockBus::new();
        let hw = HardwareInterface::mock(bus.clone());
        let even = hw.get_serial_port_interface(HardwareDevice::Port2).unwrap();
        let odd = hw.get_serial_port_interface(HardwareDevice::Port3).unwrap();
        if odd_first {
            odd.set_config(PortType::Rs232, PortTermination::NoTerm);
            even.set_config(PortType::Rs485Half, PortTermination::NoTerm);
        } else {
            even.set_config(PortType::Rs485Half, PortTermination::NoTerm);
            odd.set_config(PortType::Rs232, PortTermination::NoTerm);
        }
        bus.pins(&gpio(ChipInterface::B))
    };
    assert_eq!(run(false), Some(0x12));
    assert_eq!(run(true), Some(0x12));
}

#[test]
fn test_relays_do_not_disturb_buttons() {
    let bus = MockBus::new();
    let board = InterfaceKey::new("I2C", ChipInterface::C);
    let hw = HardwareInterface::mock(bus.clone());

    let p1 = hw.get_button_interface(HardwareDevice::P1).unwrap();
    // P1 held down while relays switch.
    bus.set_pins(&board, 0x10);

    for relay in HardwareDevice::relays() {
        hw.get_output_interface(*relay).unwrap().on();
    }
    hw.get_output_interface(HardwareDevice::P1).unwrap().on();
    assert_eq!(bus.pins(&board), Some(0x5F));
    assert_eq!(p1.get_state(), ButtonState::Down);

    hw.get_output_interface(HardwareDevice::Bank1).unwrap().off();
    assert_eq!(bus.pins(&board), Some(0x5B));
    assert!(hw.get_output_interface(HardwareDevice::Dcdc).unwrap().is_on());
    assert!(hw.get_button_interface(HardwareDevice::Wifi).unwrap().is_up());
}

#[test]
fn test_concurrent_updates_on_shared_interfaces() {
    let bus = MockBus::new();
    let hw = Arc::new(HardwareInterface::mock(bus.clone()));
    let modes = [
        PortType::Loopback,
        PortType::Rs232,
        PortType::Rs422,
        PortType::Rs485Half,
    ];

    let handles: Vec<_> = HardwareDevice::ports()
        .iter()
        .copied()
        .map(|port| {
            let hw = Arc::clone(&hw);
            thread::spawn(move || {
                let power = hw.get_output_interface(port).unwrap();
                let xcvr = hw.get_serial_port_interface(port).unwrap();
                for i in 0..200usize {
                    if i % 2 == 0 {
                        power.on();
                    } else {
                        power.off();
                    }
                    xcvr.set_config(modes[i % modes.len()], PortTermination::Term120Ohm);
                }
                // Final state depends on the port number only.
                let n = port.port_number().unwrap() as usize;
                power.set_state(if n % 2 == 0 {
                    OutputState::On
                } else {
                    OutputState::Off
                });
                xcvr.set_config(modes[n % modes.len()], PortTermination::NoTerm);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for port in HardwareDevice::ports() {
        let n = port.port_number().unwrap() as usize;
        assert_eq!(hw.get_output_interface(*port).unwrap().is_on(), n % 2 == 0);
        assert_eq!(
            hw.get_serial_port_interface(*port).unwrap().get_config(),
            Some((modes[n % modes.len()], PortTermination::NoTerm)),
            "{}",
            port
        );
    }
    for interface in [ChipInterface::A, ChipInterface::B, ChipInterface::C, ChipInterface::D] {
        assert_eq!(bus.open_count(&gpio(interface)), 1);
    }
}

#[test]
fn test_custom_address_table() {
    let table = AddressTable::new(vec![
        AddressEntry::new(
            HardwareDevice::Port0,
            InterfaceRole::PowerOutput,
            "GPIO",
            ChipInterface::A,
            0x01,
        ),
        AddressEntry::new(
            HardwareDevice::Aux,
            InterfaceRole::PowerOutput,
            "GPIO",
            ChipInterface::A,
            0x02,
        ),
    ])
    .unwrap();
    let bus = MockBus::new();
    let hw = HardwareInterface::with_table(Backend::Mock(bus.clone()), table);

    assert_eq!(hw.devices(), vec![HardwareDevice::Port0, HardwareDevice::Aux]);
    assert_eq!(hw.lookup_device("wifi"), None);
    assert!(hw.get_serial_port_interface(HardwareDevice::Port0).is_none());

    hw.get_output_interface(HardwareDevice::Aux).unwrap().on();
    assert_eq!(bus.pins(&gpio(ChipInterface::A)), Some(0x02));
}

#[test]
fn test_overlapping_masks_are_rejected() {
    let result = AddressTable::new(vec![
        AddressEntry::new(
            HardwareDevice::Port0,
            InterfaceRole::PowerOutput,
            "GPIO",
            ChipInterface::A,
            0x0C,
        ),
        AddressEntry::new(
            HardwareDevice::Port1,
            InterfaceRole::PowerOutput,
            "GPIO",
            ChipInterface::A,
            0x04,
        ),
    ]);
    assert!(matches!(result, Err(Error::OverlappingMask { .. })));
}

#[test]
fn test_overlapping_roles_of_one_port_are_rejected() {
    // Power bit inside the transceiver field would be cleared by set_config.
    let result = AddressTable::new(vec![
        AddressEntry::new(
            HardwareDevice::Port0,
            InterfaceRole::PortConfig,
            "GPIO",
            ChipInterface::A,
            0x0F,
        ),
        AddressEntry::new(
            HardwareDevice::Port0,
            InterfaceRole::PowerOutput,
            "GPIO",
            ChipInterface::A,
            0x08,
        ),
    ]);
    assert!(matches!(result, Err(Error::OverlappingMask { .. })));
}

#[test]
fn test_power_survives_transceiver_change() {
    let bus = MockBus::new();
    let hw = HardwareInterface::mock(bus.clone());
    let power = hw.get_output_interface(HardwareDevice::Port0).unwrap();
    let xcvr = hw.get_serial_port_interface(HardwareDevice::Port0).unwrap();

    power.on();
    xcvr.set_config(PortType::Rs232, PortTermination::NoTerm);
    assert!(power.is_on());
    assert_eq!(bus.pins(&gpio(ChipInterface::A)), Some(0x09));
}
