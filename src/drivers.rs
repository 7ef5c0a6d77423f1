//! Driver catalog assembly
//!
//! The catalog is fixed at compile time; its order is the auto-detection
//! priority. Real transports come first (the cartridge, then the datalink
//! cable variants) and the emulator last, so detection only lands on the
//! emulator when no hardware answered.

use satlink_core::DeviceDriver;

/// Build the driver catalog in detection-priority order.
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn catalog() -> Vec<Box<dyn DeviceDriver>> {
    let mut drivers: Vec<Box<dyn DeviceDriver>> = Vec::new();

    #[cfg(feature = "cartridge")]
    drivers.push(Box::new(satlink_cartridge::UsbCartridge::new()));

    #[cfg(feature = "datalink")]
    {
        use satlink_datalink::{DatalinkCable, Variant};

        drivers.push(Box::new(DatalinkCable::new(Variant::Red)));
        drivers.push(Box::new(DatalinkCable::new(Variant::Green)));
        drivers.push(Box::new(DatalinkCable::new(Variant::Bluetooth)));
    }

    #[cfg(feature = "dummy")]
    drivers.push(Box::new(satlink_dummy::EmulatedDevice::new()));

    drivers
}

/// Generate a short list of driver names for CLI help
pub fn driver_names_short() -> String {
    let names: Vec<&str> = catalog().iter().map(|driver| driver.name()).collect();

    if names.is_empty() {
        return "none (recompile with driver features enabled)".to_string();
    }

    names.join(", ")
}
