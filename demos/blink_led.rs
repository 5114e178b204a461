use dsm_ftdi_gpio::{Backend, FtdiOptions, HardwareDevice, HardwareInterface, MockBus};
use std::{env, thread, time::Duration};

// Blinks the WIFI LED until the P1 button is pressed.
// Pass "mock" as the first argument to run without hardware.
fn main() {
    env_logger::init();
    let backend = match env::args().nth(1).as_deref() {
        Some("mock") => Backend::Mock(MockBus::new()),
        _ => Backend::Ftdi(FtdiOptions::default()),
    };
    let hw = HardwareInterface::new(backend);
    println!("Using {} interface", hw.path());

    let (Some(led), Some(button)) = (
        hw.get_output_interface(HardwareDevice::Wifi),
        hw.get_button_interface(HardwareDevice::P1),
    ) else {
        eprintln!("Error: power board interface not available");
        return;
    };

    println!("Blinking WIFI LED (press P1 to stop)");
    for _ in 0..40 {
        if button.is_down() {
            break;
        }
        led.on();
        thread::sleep(Duration::from_millis(250));
        led.off();
        thread::sleep(Duration::from_millis(250));
    }
    println!("Done, LED is {}", led.get_state());
}
